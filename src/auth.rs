// Use 3rd party
use log::debug;
use md5::compute as md5;
use serde::Deserialize;

// Use built-in library
use std::env;

use crate::ws::{Params, WsError, WsResult};

/// Keys identifying the application, and optionally the user, to the web service.
///
/// Derives `Deserialize` so it can live in an application's own config file.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
    pub session_key: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(api_key: &str, secret: &str) -> Self {
        Self {
            api_key: api_key.to_owned(),
            secret: secret.to_owned(),
            session_key: None,
        }
    }

    pub fn session_key(mut self, session_key: &str) -> Self {
        self.session_key = Some(session_key.to_owned());
        self
    }

    /// Reads `LASTFM_API_KEY`, `LASTFM_API_SECRET` and, if set, `LASTFM_SESSION_KEY`.
    pub fn from_env() -> WsResult<Self> {
        let api_key = env::var("LASTFM_API_KEY").map_err(|_| WsError::MissingCredential("LASTFM_API_KEY"))?;
        let secret =
            env::var("LASTFM_API_SECRET").map_err(|_| WsError::MissingCredential("LASTFM_API_SECRET"))?;
        let credentials = Self::new(&api_key, &secret);
        Ok(match env::var("LASTFM_SESSION_KEY") {
            Ok(session_key) if !session_key.is_empty() => credentials.session_key(&session_key),
            _ => credentials,
        })
    }

    /// Adds `api_key` and, for calls acting on behalf of the user, `sk` and `api_sig`.
    pub fn sign(&self, params: &mut Params, authenticated: bool) -> WsResult<()> {
        params.insert("api_key".to_owned(), self.api_key.clone());
        if !authenticated {
            return Ok(());
        }
        let session_key = self
            .session_key
            .as_ref()
            .ok_or(WsError::MissingCredential("session key"))?;
        params.insert("sk".to_owned(), session_key.clone());
        let signature = signature(params, &self.secret);
        params.insert("api_sig".to_owned(), signature);
        Ok(())
    }
}

/// md5 over the key-sorted `key value` concatenation followed by the shared secret.
pub fn signature(params: &Params, secret: &str) -> String {
    let concat = params
        .iter()
        .filter(|(key, _)| *key != "format" && *key != "callback")
        .fold(String::new(), |concat, (key, value)| concat + key + value)
        + secret;
    let hex = format!("{:x}", md5(concat.as_bytes()));
    debug!("api_sig for {:?}: {}", params.get("method"), hex);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::tests::params;

    #[test]
    fn test_credentials_new() {
        let credentials = Credentials::new("key", "secret");
        assert_eq!(credentials.api_key, "key".to_owned());
        assert_eq!(credentials.secret, "secret".to_owned());
        assert_eq!(credentials.session_key.is_none(), true);
    }

    #[test]
    fn test_credentials_session_key() {
        let credentials = Credentials::new("key", "secret").session_key("sk");
        assert_eq!(credentials.session_key, Some("sk".to_owned()));
    }

    #[test]
    fn test_signature_sorted_and_salted() {
        let map = params(&[("method", "Track.love"), ("artist", "Cher"), ("format", "json")]);
        let expected = format!("{:x}", md5("artistChermethodTrack.lovesecret".as_bytes()));
        assert_eq!(signature(&map, "secret"), expected);
    }

    #[test]
    fn test_sign_read() {
        let mut map = params(&[("method", "Track.getInfo")]);
        Credentials::new("key", "secret").sign(&mut map, false).unwrap();
        assert_eq!(map["api_key"], "key");
        assert!(!map.contains_key("api_sig"));
        assert!(!map.contains_key("sk"));
    }

    #[test]
    fn test_sign_write() {
        let mut map = params(&[("method", "Track.love")]);
        Credentials::new("key", "secret")
            .session_key("sk")
            .sign(&mut map, true)
            .unwrap();
        assert_eq!(map["sk"], "sk");
        let mut unsigned = map.clone();
        unsigned.remove("api_sig");
        assert_eq!(map["api_sig"], signature(&unsigned, "secret"));
    }

    #[test]
    fn test_sign_write_without_session() {
        let mut map = params(&[("method", "Track.love")]);
        let result = Credentials::new("key", "secret").sign(&mut map, true);
        assert!(matches!(result, Err(WsError::MissingCredential(_))));
    }

    #[test]
    fn test_credentials_deserialize() {
        let credentials: Credentials =
            serde_urlencoded::from_str("api_key=key&secret=secret&session_key=sk").unwrap();
        assert_eq!(credentials.session_key, Some("sk".to_owned()));
    }
}
