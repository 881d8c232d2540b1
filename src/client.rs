// Use 3rd party
use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};

#[cfg(test)]
use mockito;

// Use built-in library
use std::borrow::Cow;

// Use internal modules
use crate::auth::Credentials;
use crate::ws::lfm::Lfm;
use crate::ws::{HttpMethod, Params, Transport, WsError, WsResult};

const LASTFM_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

impl WsError {
    async fn from_response(response: Response) -> Self {
        let status = response.status();
        match response.text().await {
            Ok(body) => Lfm::parse(&body)
                .ok()
                .and_then(|lfm| lfm.error())
                .unwrap_or_else(|| status.into()),
            Err(_) => status.into(),
        }
    }
}

/// Last.fm API over HTTP
pub struct LastFm {
    client: Client,
    credentials: Credentials,
}

impl LastFm {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    async fn api_call(&self, method: Method, mut params: Params) -> WsResult<Response> {
        #[cfg(not(test))]
        let base_url: Cow<str> = LASTFM_BASE_URL.into();
        #[cfg(test)]
        let base_url: Cow<str> = format!("{}/2.0/", mockito::server_url()).into();

        // Reads may still carry an explicit session key, e.g. Track.getInfo
        let authenticated = method == Method::POST;
        self.credentials.sign(&mut params, authenticated)?;

        let response = {
            let builder = self.client.request(method.clone(), base_url.as_ref());

            // Writes go in the body, reads in the query string
            let builder = if method == Method::POST {
                let form = serde_urlencoded::to_string(&params).map_err(|err| {
                    error!("could not encode {:?}: {}", params.get("method"), err);
                    WsError::from(err)
                })?;
                builder
                    .header(
                        CONTENT_TYPE,
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    )
                    .body(form)
            } else {
                builder.query(&params)
            };

            builder.send().await.map_err(WsError::from)?
        };

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(WsError::from_response(response).await)
        }
    }

    pub async fn get(&self, params: Params) -> WsResult<String> {
        self.api_call(Method::GET, params).await?.text().await.map_err(Into::into)
    }

    pub async fn post(&self, params: Params) -> WsResult<String> {
        self.api_call(Method::POST, params).await?.text().await.map_err(Into::into)
    }
}

#[async_trait]
impl Transport for LastFm {
    async fn submit(&self, method: HttpMethod, params: Params) -> WsResult<String> {
        debug!("{:?} {:?}", method, params.get("method"));
        match method {
            HttpMethod::Get => self.get(params).await,
            HttpMethod::Post => self.post(params).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::track::{MutableTrack, Track};
    use crate::ws::tests::params;
    use crate::ws::Ws;
    use mockito::{mock, Matcher};

    #[tokio::test]
    async fn client_get() {
        let _mock = mock_request_success(
            "GET",
            vec![
                Matcher::UrlEncoded("method".into(), "Track.getTopTags".into()),
                Matcher::UrlEncoded("api_key".into(), "some_key".into()),
            ],
            r#"<lfm status="ok"/>"#,
        );

        let response = client().get(params(&[("method", "Track.getTopTags")])).await.unwrap();
        assert_eq!(response, r#"<lfm status="ok"/>"#)
    }

    #[tokio::test]
    async fn client_post_is_signed() {
        let _mock = mock("POST", "/2.0/")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("method".into(), "Track.love".into()),
                Matcher::UrlEncoded("sk".into(), "session-id-1".into()),
                Matcher::Regex("api_sig=[0-9a-f]{32}".into()),
            ]))
            .with_status(200)
            .with_body_from_file("tests/files/love_ok.xml")
            .create();

        let response = client().post(params(&[("method", "Track.love")])).await.unwrap();
        assert!(Lfm::parse(&response).unwrap().is_ok());
    }

    #[tokio::test]
    async fn client_api_error() {
        let _mock = mock("GET", "/2.0/")
            .match_query(Matcher::UrlEncoded("method".into(), "Track.getTags".into()))
            .with_status(403)
            .with_body_from_file("tests/files/love_failed.xml")
            .create();

        let result = client().get(params(&[("method", "Track.getTags")])).await;
        match result {
            Err(WsError::Api { code, .. }) => assert_eq!(code, 9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_status_error() {
        let _mock = mock("GET", "/2.0/")
            .match_query(Matcher::UrlEncoded("method".into(), "Track.getTopFans".into()))
            .with_status(502)
            .with_body("Bad Gateway")
            .create();

        let result = client().get(params(&[("method", "Track.getTopFans")])).await;
        assert!(matches!(result, Err(WsError::StatusCode(_))));
    }

    #[tokio::test]
    async fn client_love_track() {
        let _mock = mock("POST", "/2.0/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("method".into(), "Track.love".into()),
                Matcher::UrlEncoded("artist".into(), "Cher".into()),
                Matcher::UrlEncoded("track".into(), "Believe".into()),
            ]))
            .with_status(200)
            .with_body_from_file("tests/files/love_ok.xml")
            .create();

        let ws = Ws::new(client());
        let mut track = MutableTrack::new();
        track.set_artist("Cher");
        track.set_title("Believe");

        track.love(&ws).await.unwrap();
        assert!(track.is_loved());
    }

    #[tokio::test]
    async fn client_get_info_then_apply() {
        let _mock = mock_request_success_from_file(
            "GET",
            vec![
                Matcher::UrlEncoded("method".into(), "Track.getInfo".into()),
                Matcher::UrlEncoded("artist".into(), "Cher".into()),
                Matcher::UrlEncoded("username".into(), "rj".into()),
            ],
            "tests/files/track_info.xml",
        );

        let ws = Ws::new(client());
        let mut track = MutableTrack::new();
        track.set_artist("Cher");
        track.set_title("Believe");

        let body = track.get_info(&ws, "rj", "").await.unwrap();
        track.apply_server_info(&Lfm::parse(&body).unwrap());

        assert!(track.is_loved());
        assert!(Track::from(track).image_url(crate::model::ImageSize::Large, false).is_some());
    }

    pub fn mock_request_success(method: &str, query: Vec<Matcher>, body: &str) -> mockito::Mock {
        mock(method, "/2.0/")
            .match_query(Matcher::AllOf(query))
            .with_status(200)
            .with_body(body)
            .create()
    }

    pub fn mock_request_success_from_file(
        method: &str,
        query: Vec<Matcher>,
        file_path: &str,
    ) -> mockito::Mock {
        mock(method, "/2.0/")
            .match_query(Matcher::AllOf(query))
            .with_status(200)
            .with_body_from_file(file_path)
            .create()
    }

    pub fn client() -> LastFm {
        LastFm::new(credentials())
    }

    fn credentials() -> Credentials {
        Credentials::new("some_key", "some_secret").session_key("session-id-1")
    }
}
