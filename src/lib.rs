//! Rslastfm models Last.fm tracks and the web service calls made about them.
//!
//! ## Configuration
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rslastfm = "0.1.0"
//! ```
//!
//! Requests are asynchronous: every call returns an [`Exchange`](ws::Exchange) right away and
//! runs on the Tokio runtime, so you need to be inside one.
//!
//! ## Tracks
//!
//! A [`Track`](model::track::Track) is a cheap, shared handle. Cloning it shares the record,
//! [`MutableTrack`](model::track::MutableTrack) copies the record on the first write when it is
//! shared. Tracks can be cached as XML with `to_xml` and read back with `from_xml`.
//!
//! ## Authorization
//!
//! Every call needs an API key. Calls made on behalf of a user (love, ban, scrobble, tagging)
//! also need the shared secret and a session key.
//!
//! ### Examples
//!
//! ```toml
//! [dependencies]
//! rslastfm = { version = "0.1.0" }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ```rust,no_run
//! use rslastfm::auth::Credentials;
//! use rslastfm::client::LastFm;
//! use rslastfm::model::track::MutableTrack;
//! use rslastfm::ws::Ws;
//! use dotenv::dotenv;
//!
//! #[tokio::main]
//! async fn main() {
//!     {
//!         dotenv().ok();
//!     }
//!
//!     // LASTFM_API_KEY, LASTFM_API_SECRET and LASTFM_SESSION_KEY
//!     let credentials = Credentials::from_env().unwrap();
//!     let ws = Ws::new(LastFm::new(credentials));
//!
//!     let mut track = MutableTrack::new();
//!     track.set_artist("Trivium");
//!     track.set_title("Betrayer");
//!
//!     let mut loved = track.loved_changes();
//!     track.love(&ws);
//!     println!("loved: {}", loved.recv().await.unwrap());
//! }
//! ```

pub mod auth;
pub mod client;
pub mod model;
pub mod params;
pub mod ws;
