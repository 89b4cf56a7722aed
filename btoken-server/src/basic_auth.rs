use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use btoken::Credentials;

/// Ways an `Authorization` header can fail to decode. All of them surface as
/// the same HTTP 400 so a probing client learns nothing about which stage
/// rejected it.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BasicAuthError {
    #[error("authorization scheme must be Basic")]
    Scheme,

    #[error("credentials are not valid base64")]
    Encoding,

    #[error("decoded credentials are not a user:password pair")]
    Syntax,
}

/// Decode an `Authorization: Basic <base64(user:pass)>` header value into a
/// credential pair.
///
/// This is a pure syntactic decode; whether the pair names a real user is
/// the authorizer's business. Passwords may themselves contain `:`; the
/// split happens at the first separator only.
pub fn decode(header: &str) -> Result<Credentials, BasicAuthError> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))
        .ok_or(BasicAuthError::Scheme)?
        .trim();
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| BasicAuthError::Encoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicAuthError::Encoding)?;
    let (username, password) = decoded.split_once(':').ok_or(BasicAuthError::Syntax)?;
    Ok(Credentials::new(username, password))
}
