//! Request parameters built from tracks.
//!
//! Every function here is pure: it only projects track fields into a [`Params`] map.

use crate::model::track::Track;
use crate::ws::Params;

/// `method=Track.<verb>` plus the keys addressing `track`.
///
/// With `use_mbid` and a known MusicBrainz id the track is addressed by `mbid` alone, otherwise
/// by `artist` and `track`.
pub fn track_params(track: &Track, verb: &str, use_mbid: bool) -> Params {
    let mut map = Params::new();
    map.insert("method".to_owned(), format!("Track.{}", verb));
    if use_mbid && !track.mbid().is_empty() {
        map.insert("mbid".to_owned(), track.mbid().to_owned());
    } else {
        map.insert("artist".to_owned(), track.artist().to_owned());
        map.insert("track".to_owned(), track.title().to_owned());
    }
    map
}

pub fn scrobble_params(track: &Track) -> Params {
    let mut map = Params::new();
    map.insert("method".to_owned(), "Track.scrobble".to_owned());
    insert_scrobble(&mut map, track, |key| key.to_owned());
    map
}

/// Same keys as [`scrobble_params`], suffixed with `[i]` for the i-th track.
pub fn scrobble_batch_params(tracks: &[Track]) -> Params {
    let mut map = Params::new();
    map.insert("method".to_owned(), "Track.scrobbleBatch".to_owned());
    for (i, track) in tracks.iter().enumerate() {
        insert_scrobble(&mut map, track, |key| format!("{}[{}]", key, i));
    }
    map
}

fn insert_scrobble<K>(map: &mut Params, track: &Track, key: K)
where
    K: Fn(&str) -> String,
{
    map.insert(key("duration"), track.duration().to_string());
    map.insert(key("timestamp"), track.timestamp().timestamp().to_string());
    map.insert(key("track"), track.title().to_owned());
    map.insert(key("context"), track.extra("playerName").to_owned());
    if !track.album().is_empty() {
        map.insert(key("album"), track.album().to_owned());
    }
    map.insert(key("artist"), track.artist().to_owned());
    if !track.mbid().is_empty() {
        map.insert(key("mbid"), track.mbid().to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::MutableTrack;
    use chrono::{TimeZone, Utc};

    fn track(artist: &str, title: &str, album: &str, mbid: &str) -> Track {
        let mut track = MutableTrack::new();
        track.set_artist(artist);
        track.set_title(title);
        track.set_album(album);
        track.set_mbid(mbid);
        track.into()
    }

    #[test]
    fn addressed_by_mbid_when_known() {
        let map = track_params(&track("Cher", "Believe", "", "abc-123"), "getInfo", true);

        assert_eq!(map["method"], "Track.getInfo");
        assert_eq!(map["mbid"], "abc-123");
        assert!(!map.contains_key("artist"));
        assert!(!map.contains_key("track"));
    }

    #[test]
    fn addressed_by_names_without_mbid() {
        let map = track_params(&track("Cher", "Believe", "", ""), "getInfo", true);

        assert_eq!(map["artist"], "Cher");
        assert_eq!(map["track"], "Believe");
        assert!(!map.contains_key("mbid"));
    }

    #[test]
    fn mbid_ignored_unless_asked() {
        let map = track_params(&track("Cher", "Believe", "", "abc-123"), "love", false);

        assert_eq!(map["method"], "Track.love");
        assert_eq!(map["artist"], "Cher");
        assert!(!map.contains_key("mbid"));
    }

    #[test]
    fn scrobble() {
        let mut t = MutableTrack::new();
        t.set_artist("Cher");
        t.set_title("Believe");
        t.set_duration(239);
        t.set_timestamp(Utc.timestamp_opt(1_600_000_000, 0).unwrap());
        t.set_extra("playerName", "foo");

        let map = scrobble_params(&t);

        assert_eq!(map["method"], "Track.scrobble");
        assert_eq!(map["duration"], "239");
        assert_eq!(map["timestamp"], "1600000000");
        assert_eq!(map["track"], "Believe");
        assert_eq!(map["artist"], "Cher");
        assert_eq!(map["context"], "foo");
        assert!(!map.contains_key("album"));
        assert!(!map.contains_key("mbid"));
    }

    #[test]
    fn scrobble_context_is_empty_without_player() {
        let map = scrobble_params(&track("Cher", "Believe", "Believe", "abc"));

        assert_eq!(map["context"], "");
        assert_eq!(map["album"], "Believe");
        assert_eq!(map["mbid"], "abc");
    }

    #[test]
    fn scrobble_batch() {
        let mut first = MutableTrack::new();
        first.set_artist("Cher");
        first.set_title("Believe");
        first.set_album("Believe");
        first.set_duration(239);
        first.set_timestamp(Utc.timestamp_opt(100, 0).unwrap());
        let mut second = MutableTrack::new();
        second.set_artist("Trivium");
        second.set_title("The Sin and the Sentence");
        second.set_mbid("f2d9c1b0");
        second.set_duration(350);
        second.set_timestamp(Utc.timestamp_opt(400, 0).unwrap());

        let map = scrobble_batch_params(&[first.into(), second.into()]);

        assert_eq!(map["method"], "Track.scrobbleBatch");
        assert_eq!(map["duration[0]"], "239");
        assert_eq!(map["duration[1]"], "350");
        assert_eq!(map["timestamp[0]"], "100");
        assert_eq!(map["timestamp[1]"], "400");
        assert_eq!(map["track[0]"], "Believe");
        assert_eq!(map["track[1]"], "The Sin and the Sentence");
        assert_eq!(map["artist[0]"], "Cher");
        assert_eq!(map["artist[1]"], "Trivium");
        assert_eq!(map["album[0]"], "Believe");
        assert!(!map.contains_key("album[1]"));
        assert!(!map.contains_key("mbid[0]"));
        assert_eq!(map["mbid[1]"], "f2d9c1b0");
    }

    #[test]
    fn scrobble_batch_empty() {
        let map = scrobble_batch_params(&[]);
        assert_eq!(map.len(), 1);
    }
}
