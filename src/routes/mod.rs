/// Router Module Index
///
/// Splits the routing table by who may reach it. Authentication here only means
/// "asserted an identity": the `Caller` extractor guards the authenticated and
/// admin routers, and every authorization decision is made inside the handlers.

/// Routes reachable without an identity header.
pub mod public;

/// Routes that require the identity header.
pub mod authenticated;

/// Routes under `/admin`; handlers apply the admin-level gate themselves.
pub mod admin;
