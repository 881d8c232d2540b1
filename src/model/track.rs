// Use 3rd party
use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use tokio::sync::broadcast;
use url::{form_urlencoded, Url};
use xmltree::{Element, XMLNode};

// Use built-in library
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

// Use local
use crate::model::love::LoveState;
use crate::model::xml::{append_text_element, child_elements, child_number, child_text, text_element};
use crate::model::{ImageSize, Source};
use crate::params;
use crate::ws::lfm::Lfm;
use crate::ws::{Exchange, HttpMethod, Params, Ws};

lazy_static! {
    static ref SERVE_SIZE: Regex = Regex::new(r"/serve/(\d*)s?/").unwrap();
    static ref WWW: Url = Url::parse("https://www.last.fm").unwrap();
}

const AUDIO_EXTENSIONS: [&str; 9] = [
    ".mp3", ".ogg", ".oga", ".opus", ".flac", ".m4a", ".aac", ".wav", ".wma",
];

/// The record behind one or more [`Track`] handles.
#[derive(Debug)]
pub struct TrackData {
    artist: String,
    album: String,
    title: String,
    track_number: u32,
    duration: u32,
    url: Option<Url>,
    source: Source,
    rating: u32,
    fingerprint_id: i32,
    mbid: String,
    timestamp: DateTime<Utc>,
    // Shared with love/unlove requests in flight
    love: Arc<LoveState>,
    null: bool,
    images: BTreeMap<ImageSize, Url>,
    extras: BTreeMap<String, String>,
}

impl Default for TrackData {
    fn default() -> Self {
        Self {
            artist: String::new(),
            album: String::new(),
            title: String::new(),
            track_number: 0,
            duration: 0,
            url: None,
            source: Source::Unknown,
            rating: 0,
            fingerprint_id: -1,
            mbid: String::new(),
            timestamp: DateTime::<Utc>::from(UNIX_EPOCH),
            love: Arc::new(LoveState::new(false)),
            null: false,
            images: BTreeMap::new(),
            extras: BTreeMap::new(),
        }
    }
}

/// A copy gets its own loved flag and no observers.
impl Clone for TrackData {
    fn clone(&self) -> Self {
        Self {
            artist: self.artist.clone(),
            album: self.album.clone(),
            title: self.title.clone(),
            track_number: self.track_number,
            duration: self.duration,
            url: self.url.clone(),
            source: self.source,
            rating: self.rating,
            fingerprint_id: self.fingerprint_id,
            mbid: self.mbid.clone(),
            timestamp: self.timestamp,
            love: Arc::new(LoveState::new(self.love.get())),
            null: self.null,
            images: self.images.clone(),
            extras: self.extras.clone(),
        }
    }
}

impl PartialEq for TrackData {
    fn eq(&self, other: &Self) -> bool {
        self.artist == other.artist
            && self.album == other.album
            && self.title == other.title
            && self.track_number == other.track_number
            && self.duration == other.duration
            && self.url == other.url
            && self.source == other.source
            && self.rating == other.rating
            && self.fingerprint_id == other.fingerprint_id
            && self.mbid == other.mbid
            && self.timestamp == other.timestamp
            && self.love.get() == other.love.get()
            && self.null == other.null
            && self.images == other.images
            && self.extras == other.extras
    }
}

/// A read-only handle on a track.
///
/// Cloning a `Track` shares the record; use [`Track::detached`] for an independent copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    d: Arc<TrackData>,
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl Track {
    /// The null track.
    pub fn new() -> Self {
        Self {
            d: Arc::new(TrackData {
                null: true,
                ..TrackData::default()
            }),
        }
    }

    /// Reads a cached `<track>` element. An absent or empty element gives the null track.
    pub fn from_xml(element: Option<&Element>) -> Self {
        let e = match element {
            Some(e) if child_elements(e).next().is_some() => e,
            _ => return Self::new(),
        };

        let mut d = TrackData {
            artist: child_text(e, "artist"),
            album: child_text(e, "album"),
            title: child_text(e, "track"),
            duration: child_number(e, "duration", 0),
            url: parse_url(&child_text(e, "url")),
            rating: child_number(e, "rating", 0),
            source: Source::from_i32(child_number(e, "source", 0)),
            fingerprint_id: child_number(e, "fpId", -1),
            mbid: child_text(e, "mbId"),
            timestamp: Utc
                .timestamp_opt(child_number::<u32>(e, "timestamp", 0).into(), 0)
                .single()
                .unwrap_or_else(|| DateTime::<Utc>::from(UNIX_EPOCH)),
            love: Arc::new(LoveState::new(child_text(e, "loved") != "0")),
            ..TrackData::default()
        };

        for image in child_elements(e).filter(|child| child.name == "image") {
            let size = image
                .attributes
                .get("size")
                .and_then(|size| size.trim().parse().ok())
                .and_then(ImageSize::from_i32);
            match (size, parse_url(&child_text_of(image))) {
                (Some(size), Some(url)) => {
                    d.images.insert(size, url);
                }
                (None, _) => warn!("ignoring image with size {:?}", image.attributes.get("size")),
                _ => {}
            }
        }

        if let Some(extras) = e.get_child("extras") {
            for extra in child_elements(extras) {
                d.extras.insert(extra.name.clone(), child_text_of(extra));
            }
        }

        Self { d: Arc::new(d) }
    }

    /// Writes the track as a `<track>` element. Empty text fields are left out.
    pub fn to_xml(&self) -> Element {
        let d = &self.d;
        let mut item = Element::new("track");

        append_text_element(&mut item, "artist", &d.artist);
        append_text_element(&mut item, "album", &d.album);
        append_text_element(&mut item, "track", &d.title);
        append_text_element(&mut item, "duration", &d.duration.to_string());
        append_text_element(&mut item, "timestamp", &d.timestamp.timestamp().to_string());
        append_text_element(&mut item, "url", d.url.as_ref().map_or("", Url::as_str));
        append_text_element(&mut item, "source", &d.source.to_i32().to_string());
        append_text_element(&mut item, "rating", &d.rating.to_string());
        append_text_element(&mut item, "fpId", &d.fingerprint_id.to_string());
        append_text_element(&mut item, "mbId", &d.mbid);
        append_text_element(&mut item, "loved", if self.is_loved() { "1" } else { "0" });

        for (size, url) in &d.images {
            let mut image = text_element("image", url.as_str());
            image
                .attributes
                .insert("size".to_owned(), size.to_i32().to_string());
            item.children.push(XMLNode::Element(image));
        }

        let mut extras = Element::new("extras");
        for (key, value) in &d.extras {
            extras.children.push(XMLNode::Element(text_element(key, value)));
        }
        item.children.push(XMLNode::Element(extras));

        item
    }

    pub fn artist(&self) -> &str {
        &self.d.artist
    }

    pub fn album(&self) -> &str {
        &self.d.album
    }

    pub fn title(&self) -> &str {
        &self.d.title
    }

    pub fn track_number(&self) -> u32 {
        self.d.track_number
    }

    /// In seconds.
    pub fn duration(&self) -> u32 {
        self.d.duration
    }

    pub fn url(&self) -> Option<&Url> {
        self.d.url.as_ref()
    }

    pub fn source(&self) -> Source {
        self.d.source
    }

    pub fn rating(&self) -> u32 {
        self.d.rating
    }

    /// `-1` when the track has no fingerprint.
    pub fn fingerprint_id(&self) -> i32 {
        self.d.fingerprint_id
    }

    pub fn mbid(&self) -> &str {
        &self.d.mbid
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.d.timestamp
    }

    pub fn is_loved(&self) -> bool {
        self.d.love.get()
    }

    pub fn is_null(&self) -> bool {
        self.d.null
    }

    /// The extra stored under `key`, or the empty string.
    pub fn extra(&self, key: &str) -> &str {
        self.d.extras.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.d.extras
    }

    /// Artwork for `size`. With `square` the URL is rewritten to the square crop Last.fm serves.
    pub fn image_url(&self, size: ImageSize, square: bool) -> Option<Url> {
        let url = self.d.images.get(&size)?;
        if !square {
            return Some(url.clone());
        }
        let squared = SERVE_SIZE.replace_all(url.as_str(), "/serve/${1}s/");
        Url::parse(&squared).ok()
    }

    /// `artist <separator> title`, degrading to whichever part is known, then to the file name.
    pub fn display_string(&self, separator: char) -> String {
        let d = &self.d;
        if d.artist.is_empty() {
            if d.title.is_empty() {
                return self.file_name();
            }
            return d.title.clone();
        }
        if d.title.is_empty() {
            return d.artist.clone();
        }
        format!("{} {} {}", d.artist, separator, d.title)
    }

    fn file_name(&self) -> String {
        let segment = self
            .d
            .url
            .as_ref()
            .and_then(Url::path_segments)
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        urlencoding::decode(segment)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| segment.to_owned())
    }

    pub fn duration_string(&self) -> String {
        format_duration(self.d.duration)
    }

    /// The track's page on the Last.fm website.
    pub fn www(&self) -> Url {
        let album = if self.d.album.is_empty() { "_" } else { self.d.album.as_str() };
        let path: String = ["music", self.d.artist.as_str(), album, self.d.title.as_str()]
            .iter()
            .map(|segment| {
                let encoded: String = form_urlencoded::byte_serialize(segment.as_bytes()).collect();
                format!("/{}", encoded)
            })
            .collect();
        let mut url = WWW.clone();
        url.set_path(&path);
        url
    }

    pub fn is_local_audio_file(&self) -> bool {
        match &self.d.url {
            Some(url) if url.scheme() == "file" => {
                let path = url.path().to_lowercase();
                AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
            }
            _ => false,
        }
    }

    /// An independent copy of the record.
    pub fn detached(&self) -> Self {
        Self {
            d: Arc::new((*self.d).clone()),
        }
    }

    /// Notified with the loved flag each time a love or unlove request on this record finishes.
    pub fn loved_changes(&self) -> broadcast::Receiver<bool> {
        self.d.love.subscribe()
    }

    pub fn params(&self, verb: &str, use_mbid: bool) -> Params {
        params::track_params(self, verb, use_mbid)
    }

    pub fn get_top_tags(&self, ws: &Ws) -> Exchange {
        ws.get(self.params("getTopTags", true))
    }

    pub fn get_top_fans(&self, ws: &Ws) -> Exchange {
        ws.get(self.params("getTopFans", true))
    }

    pub fn get_tags(&self, ws: &Ws) -> Exchange {
        ws.get(self.params("getTags", true))
    }

    /// `username` and `session_key` are only sent when non-empty.
    pub fn get_info(&self, ws: &Ws, username: &str, session_key: &str) -> Exchange {
        let mut map = self.params("getInfo", true);
        if !username.is_empty() {
            map.insert("username".to_owned(), username.to_owned());
        }
        if !session_key.is_empty() {
            map.insert("sk".to_owned(), session_key.to_owned());
        }
        ws.get(map)
    }

    /// `None` when there are no tags to add.
    pub fn add_tags<S: AsRef<str>>(&self, ws: &Ws, tags: &[S]) -> Option<Exchange> {
        if tags.is_empty() {
            return None;
        }
        let mut map = self.params("addTags", false);
        map.insert("tags".to_owned(), join(tags));
        Some(ws.post(map))
    }

    pub fn remove_tag(&self, ws: &Ws, tag: &str) -> Option<Exchange> {
        if tag.is_empty() {
            return None;
        }
        let mut map = self.params("removeTag", false);
        map.insert("tags".to_owned(), tag.to_owned());
        Some(ws.post(map))
    }

    pub fn share<S: AsRef<str>>(
        &self,
        ws: &Ws,
        recipients: &[S],
        message: &str,
        public: bool,
    ) -> Option<Exchange> {
        if recipients.is_empty() {
            return None;
        }
        let mut map = self.params("share", false);
        map.insert("recipient".to_owned(), join(recipients));
        map.insert("public".to_owned(), if public { "1" } else { "0" }.to_owned());
        if !message.is_empty() {
            map.insert("message".to_owned(), message.to_owned());
        }
        Some(ws.post(map))
    }

    pub fn scrobble(&self, ws: &Ws) -> Exchange {
        ws.post(params::scrobble_params(self))
    }

    pub fn scrobble_batch(ws: &Ws, tracks: &[Track]) -> Exchange {
        ws.post(params::scrobble_batch_params(tracks))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string('–'))
    }
}

/// `m:ss` below an hour, `hh:mm:ss` from then on.
pub fn format_duration(seconds: u32) -> String {
    let (hours, minutes, seconds) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours == 0 {
        format!("{}:{:02}", minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

fn whole_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let seconds = timestamp.timestamp();
    let clamped = seconds.max(0).min(i64::from(u32::MAX));
    if clamped != seconds {
        warn!("clamping timestamp {} to {}", seconds, clamped);
    }
    Utc.timestamp_opt(clamped, 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::from(UNIX_EPOCH))
}

fn parse_url(text: &str) -> Option<Url> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Url::parse(text)
        .map_err(|err| warn!("ignoring url {:?}: {}", text, err))
        .ok()
}

fn child_text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(AsRef::as_ref).collect::<Vec<&str>>().join(",")
}

/// A [`Track`] handle that may change the record.
///
/// Writes detach the record first when other handles share it.
#[derive(Clone, Debug, PartialEq)]
pub struct MutableTrack(Track);

impl Default for MutableTrack {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MutableTrack {
    type Target = Track;

    fn deref(&self) -> &Track {
        &self.0
    }
}

impl From<Track> for MutableTrack {
    fn from(track: Track) -> Self {
        Self(track)
    }
}

impl From<MutableTrack> for Track {
    fn from(track: MutableTrack) -> Self {
        track.0
    }
}

impl MutableTrack {
    /// An empty, non-null track.
    pub fn new() -> Self {
        Self(Track {
            d: Arc::new(TrackData::default()),
        })
    }

    fn data(&mut self) -> &mut TrackData {
        let d = Arc::make_mut(&mut self.0.d);
        d.null = false;
        d
    }

    pub fn set_artist(&mut self, artist: &str) {
        self.data().artist = artist.trim().to_owned();
    }

    pub fn set_album(&mut self, album: &str) {
        self.data().album = album.trim().to_owned();
    }

    pub fn set_title(&mut self, title: &str) {
        self.data().title = title.trim().to_owned();
    }

    pub fn set_track_number(&mut self, track_number: u32) {
        self.data().track_number = track_number;
    }

    pub fn set_duration(&mut self, seconds: u32) {
        self.data().duration = seconds;
    }

    pub fn set_url(&mut self, url: Option<Url>) {
        self.data().url = url;
    }

    pub fn set_source(&mut self, source: Source) {
        self.data().source = source;
    }

    pub fn set_rating(&mut self, rating: u32) {
        self.data().rating = rating;
    }

    pub fn set_fingerprint_id(&mut self, id: i32) {
        self.data().fingerprint_id = id;
    }

    pub fn set_mbid(&mut self, mbid: &str) {
        self.data().mbid = mbid.to_owned();
    }

    /// Kept in whole seconds, clamped to what `<timestamp>` can hold.
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.data().timestamp = whole_seconds(timestamp);
    }

    pub fn set_loved(&mut self, loved: bool) {
        self.data().love.set(loved);
    }

    pub fn set_image(&mut self, size: ImageSize, url: Url) {
        self.data().images.insert(size, url);
    }

    pub fn set_extra(&mut self, key: &str, value: &str) {
        self.data().extras.insert(key.to_owned(), value.to_owned());
    }

    pub fn remove_extra(&mut self, key: &str) {
        self.data().extras.remove(key);
    }

    pub fn detached(&self) -> Self {
        Self(self.0.detached())
    }

    /// Takes artwork and the loved flag from a `Track.getInfo` response.
    ///
    /// Only non-empty image URLs replace what is stored.
    pub fn apply_server_info(&mut self, lfm: &Lfm) {
        let d = self.data();
        for size in ImageSize::ALL.iter() {
            if let Some(url) = parse_url(&lfm.image(*size)) {
                d.images.insert(*size, url);
            }
        }
        d.love.set(lfm.text("userloved") == "1");
    }

    /// Asks the service to love the track. The flag flips once the service confirms.
    pub fn love(&self, ws: &Ws) -> Exchange {
        self.toggle_love(ws, "love", true)
    }

    pub fn unlove(&self, ws: &Ws) -> Exchange {
        self.toggle_love(ws, "unlove", false)
    }

    fn toggle_love(&self, ws: &Ws, verb: &str, target: bool) -> Exchange {
        let love = Arc::clone(&self.0.d.love);
        ws.submit(HttpMethod::Post, self.params(verb, false), move |reply| {
            love.on_finished(reply, target)
        })
    }

    pub fn ban(&mut self, ws: &Ws) -> Exchange {
        self.set_extra("rating", "B");
        ws.post(self.params("ban", false))
    }
}
