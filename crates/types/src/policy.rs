//! Policy constants shared between prompt construction and scanning.

/// Modules a generated server may import. Relative imports are always
/// allowed; anything else off this list fails sandbox compliance. The
/// generation instructions name the same list, so the two sides cannot
/// drift independently.
pub const SANDBOX_ALLOWED_MODULES: &[&str] = &[
    "axios",
    "body-parser",
    "buffer",
    "cors",
    "crypto",
    "express",
    "http",
    "https",
    "node-fetch",
    "querystring",
    "url",
    "util",
    "zod",
];

/// Header carrying the shared secret that guards tool listing and calls on a
/// generated server.
pub const SHARED_SECRET_HEADER: &str = "x-toolforge-secret";

/// Environment variable the generated server reads the shared secret from.
pub const SHARED_SECRET_ENV: &str = "TOOLFORGE_SECRET";
