// Caller credential lookup.

/// Header carrying the caller's credential for a protected route.
pub const PROTECTED_TOKEN_HEADER: &str = "od-protected-token";

/// Query parameter used when the header is absent.
pub const PROTECTED_TOKEN_QUERY: &str = "odpt";

/// Where a credential may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header(&'static str),
    Query(&'static str),
}

/// Lookup order; the first present value wins.
pub const CREDENTIAL_SOURCES: [CredentialSource; 2] = [
    CredentialSource::Header(PROTECTED_TOKEN_HEADER),
    CredentialSource::Query(PROTECTED_TOKEN_QUERY),
];

/// Anything a credential can be read from (usually an HTTP request).
pub trait CredentialCarrier {
    fn header(&self, name: &str) -> Option<&str>;
    fn query(&self, name: &str) -> Option<&str>;
}

/// The caller-supplied credential, following [`CREDENTIAL_SOURCES`].
pub fn caller_credential<C>(carrier: &C) -> Option<&str>
where
    C: CredentialCarrier + ?Sized,
{
    CREDENTIAL_SOURCES.iter().find_map(|source| match source {
        CredentialSource::Header(name) => carrier.header(name),
        CredentialSource::Query(name) => carrier.query(name),
    })
}
