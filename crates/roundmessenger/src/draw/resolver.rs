// Draw resolution: turns the rooms of a round into one addressed message per
// participant.
//
// Resolution is synchronous and finishes before anything is sent. Directory
// failures and malformed chat handles abort the whole run; a venue without a
// category or a participant without a chat account is logged and skipped.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::category::Categories;
use super::links::{compose_links, PrivateUrls};
use super::position::JudgePosition;
use super::{OutgoingMessage, Room};
use crate::chat::{HandleError, UserId};
use crate::directory::{Directory, DirectoryError, Participant};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("directory lookup failed in room {venue:?} (venue id {venue_id:?}): {source}")]
    Directory {
        venue: String,
        venue_id: String,
        source: DirectoryError,
    },

    #[error("bad chat handle in room {venue:?} (venue id {venue_id:?}): {source}")]
    MalformedHandle {
        venue: String,
        venue_id: String,
        source: HandleError,
    },

    #[error("team {team_id} in room {venue:?} has no side name")]
    MissingSide { venue: String, team_id: String },
}

/// Per-room context shared by every message built for that room.
struct RoomContext<'a> {
    venue: &'a str,
    venue_id: &'a str,
    category_url: &'a str,
}

impl RoomContext<'_> {
    fn directory_error(&self, source: DirectoryError) -> ResolveError {
        ResolveError::Directory {
            venue: self.venue.to_string(),
            venue_id: self.venue_id.to_string(),
            source,
        }
    }

    fn recipient(&self, handle: &str) -> Result<UserId, ResolveError> {
        handle
            .parse()
            .map_err(|source| ResolveError::MalformedHandle {
                venue: self.venue.to_string(),
                venue_id: self.venue_id.to_string(),
                source,
            })
    }
}

/// Build the message list for `rooms`, in room order, speakers before judges
/// within each room.
pub fn resolve_draw<D, P>(
    rooms: &[Room],
    venue_names: &HashMap<String, String>,
    categories: &Categories,
    directory: &D,
    private_urls: &P,
) -> Result<Vec<OutgoingMessage>, ResolveError>
where
    D: Directory + ?Sized,
    P: PrivateUrls + ?Sized,
{
    let mut messages = Vec::new();

    for room in rooms {
        let venue = venue_names
            .get(&room.venue_id)
            .map(String::as_str)
            .unwrap_or_default();

        let category_url = match categories.lookup(venue) {
            Ok(category) => category.url.as_str(),
            Err(e) => {
                warn!("{e}");
                ""
            }
        };

        let ctx = RoomContext {
            venue,
            venue_id: &room.venue_id,
            category_url,
        };

        let before = messages.len();
        resolve_speakers(&ctx, room, directory, private_urls, &mut messages)?;
        resolve_judges(&ctx, room, directory, private_urls, &mut messages)?;

        debug!(
            venue,
            messages = messages.len() - before,
            "queued messages for room"
        );
    }

    Ok(messages)
}

fn resolve_speakers<D, P>(
    ctx: &RoomContext<'_>,
    room: &Room,
    directory: &D,
    private_urls: &P,
    out: &mut Vec<OutgoingMessage>,
) -> Result<(), ResolveError>
where
    D: Directory + ?Sized,
    P: PrivateUrls + ?Sized,
{
    for (i, team_id) in room.team_ids.iter().enumerate() {
        let side = room
            .side_names
            .get(i)
            .ok_or_else(|| ResolveError::MissingSide {
                venue: ctx.venue.to_string(),
                team_id: team_id.clone(),
            })?;

        let members = directory
            .participants_from_team(team_id)
            .map_err(|e| ctx.directory_error(e))?;

        for Participant { discord_id, url_key } in &members {
            if discord_id.is_empty() {
                warn!("Speaker on team {team_id} has no discord ID.");
                continue;
            }

            let body = format!(
                "In this round, you will be speaking in **{side}** in room **{venue}**.{links}",
                venue = ctx.venue,
                links = compose_links(private_urls, ctx.category_url, url_key),
            );
            out.push(OutgoingMessage {
                recipient: ctx.recipient(discord_id)?,
                body,
            });
        }
    }
    Ok(())
}

fn resolve_judges<D, P>(
    ctx: &RoomContext<'_>,
    room: &Room,
    directory: &D,
    private_urls: &P,
    out: &mut Vec<OutgoingMessage>,
) -> Result<(), ResolveError>
where
    D: Directory + ?Sized,
    P: PrivateUrls + ?Sized,
{
    let judge_ids = room.judge_ids();
    let judges = directory
        .participants_by_ids(&judge_ids)
        .map_err(|e| ctx.directory_error(e))?;

    for (j, (judge_id, Participant { discord_id, url_key })) in
        judge_ids.iter().zip(&judges).enumerate()
    {
        if discord_id.is_empty() {
            warn!("Adjudicator {judge_id} has no discord ID.");
            continue;
        }

        let position = JudgePosition::from_index(j, room.panellist_ids.len());
        let body = format!(
            "In this round, you will be judging as **{position}** in room **{venue}**.{links}",
            venue = ctx.venue,
            links = compose_links(private_urls, ctx.category_url, url_key),
        );
        out.push(OutgoingMessage {
            recipient: ctx.recipient(discord_id)?,
            body,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::category::{Category, MatchRule};
    use pretty_assertions::assert_eq;

    /// Directory backed by plain maps.
    #[derive(Default)]
    struct MapDirectory {
        teams: HashMap<String, Vec<Participant>>,
        people: HashMap<String, Participant>,
        fail: bool,
    }

    impl MapDirectory {
        fn team(mut self, team_id: &str, handles: &[&str]) -> Self {
            let members = handles
                .iter()
                .map(|h| Participant {
                    discord_id: h.to_string(),
                    url_key: String::new(),
                })
                .collect();
            self.teams.insert(team_id.to_string(), members);
            self
        }

        fn person(mut self, id: &str, handle: &str, url_key: &str) -> Self {
            self.people.insert(
                id.to_string(),
                Participant {
                    discord_id: handle.to_string(),
                    url_key: url_key.to_string(),
                },
            );
            self
        }
    }

    impl Directory for MapDirectory {
        fn participants_from_team(
            &self,
            team_id: &str,
        ) -> Result<Vec<Participant>, DirectoryError> {
            if self.fail {
                return Err(DirectoryError::Poisoned);
            }
            Ok(self.teams.get(team_id).cloned().unwrap_or_default())
        }

        fn participants_by_ids(&self, ids: &[String]) -> Result<Vec<Participant>, DirectoryError> {
            if self.fail {
                return Err(DirectoryError::Poisoned);
            }
            Ok(ids
                .iter()
                .map(|id| self.people.get(id).cloned().unwrap_or_default())
                .collect())
        }
    }

    struct KeyUrls;

    impl PrivateUrls for KeyUrls {
        fn private_url_from_key(&self, key: &str) -> String {
            format!("https://tab/p/{key}/")
        }
    }

    fn venues() -> HashMap<String, String> {
        HashMap::from([("v1".to_string(), "Room A".to_string())])
    }

    fn zoom_categories() -> Categories {
        Categories::new(vec![Category {
            name: "A".into(),
            url: "https://zoom/a".into(),
            rule: MatchRule::Exact("Room A".into()),
        }])
    }

    fn room(teams: &[&str], chair: &str, panellists: &[&str], trainees: &[&str]) -> Room {
        let strings = |xs: &[&str]| xs.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        Room {
            venue_id: "v1".into(),
            team_ids: strings(teams),
            side_names: ["Proposition", "Opposition"]
                .iter()
                .take(teams.len())
                .map(|s| s.to_string())
                .collect(),
            chair_id: chair.into(),
            panellist_ids: strings(panellists),
            trainee_ids: strings(trainees),
        }
    }

    fn recipients(messages: &[OutgoingMessage]) -> Vec<u64> {
        messages.iter().map(|m| m.recipient.0).collect()
    }

    // -- Speakers --

    #[test]
    fn one_message_per_linked_speaker() {
        let directory = MapDirectory::default()
            .team("t1", &["1", "", "2"])
            .team("t2", &["3", "4"]);
        let rooms = [room(&["t1", "t2"], "", &[], &[])];

        let messages =
            resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls).unwrap();

        assert_eq!(recipients(&messages), vec![1, 2, 3, 4]);
        assert_eq!(
            messages[0].body,
            "In this round, you will be speaking in **Proposition** in room **Room A**."
        );
        assert_eq!(
            messages[2].body,
            "In this round, you will be speaking in **Opposition** in room **Room A**."
        );
    }

    #[test]
    fn team_without_side_name_is_fatal() {
        let directory = MapDirectory::default().team("t1", &["1"]);
        let mut r = room(&["t1"], "", &[], &[]);
        r.side_names.clear();

        let err = resolve_draw(&[r], &venues(), &Categories::default(), &directory, &KeyUrls)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingSide { team_id, .. } if team_id == "t1"));
    }

    // -- Judges --

    #[test]
    fn judge_positions_follow_list_order() {
        let directory = MapDirectory::default()
            .person("c", "10", "")
            .person("p1", "11", "")
            .person("p2", "12", "")
            .person("tr", "13", "");
        let rooms = [room(&[], "c", &["p1", "p2"], &["tr"])];

        let messages =
            resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls).unwrap();

        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(
            bodies,
            vec![
                "In this round, you will be judging as **the chair** in room **Room A**.",
                "In this round, you will be judging as **a panellist** in room **Room A**.",
                "In this round, you will be judging as **a panellist** in room **Room A**.",
                "In this round, you will be judging as **a trainee** in room **Room A**.",
            ]
        );
    }

    #[test]
    fn unlinked_judges_are_skipped() {
        let directory = MapDirectory::default()
            .person("c", "", "")
            .person("p1", "11", "");
        let rooms = [room(&[], "c", &["p1"], &["unknown"])];

        let messages =
            resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls).unwrap();

        assert_eq!(recipients(&messages), vec![11]);
        assert!(messages[0].body.contains("**a panellist**"));
    }

    #[test]
    fn unallocated_chair_keeps_panellist_positions() {
        let directory = MapDirectory::default().person("p1", "11", "");
        let rooms = [room(&[], "", &["p1"], &[])];

        let messages =
            resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.contains("**a panellist**"));
    }

    // -- Links and venues --

    #[test]
    fn links_appended_from_category_and_url_key() {
        let directory = MapDirectory::default().person("c", "10", "secret");
        let rooms = [room(&[], "c", &[], &[])];

        let messages =
            resolve_draw(&rooms, &venues(), &zoom_categories(), &directory, &KeyUrls).unwrap();

        assert_eq!(
            messages[0].body,
            "In this round, you will be judging as **the chair** in room **Room A**.\
             \n\nThe link to your Zoom room is https://zoom/a.\
             \n\nYour private URL is https://tab/p/secret/."
        );
    }

    #[test]
    fn unmapped_venue_degrades_to_no_link() {
        let directory = MapDirectory::default().person("c", "10", "");
        let mut r = room(&[], "c", &[], &[]);
        r.venue_id = "nowhere".into();

        let messages =
            resolve_draw(&[r], &venues(), &zoom_categories(), &directory, &KeyUrls).unwrap();
        assert_eq!(
            messages[0].body,
            "In this round, you will be judging as **the chair** in room ****."
        );
    }

    #[test]
    fn speakers_precede_judges_and_rooms_keep_order() {
        let directory = MapDirectory::default()
            .team("t1", &["1"])
            .team("t2", &["2"])
            .person("c1", "100", "")
            .person("c2", "200", "");
        let rooms = [
            room(&["t1"], "c1", &[], &[]),
            room(&["t2"], "c2", &[], &[]),
        ];

        let messages =
            resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls).unwrap();
        assert_eq!(recipients(&messages), vec![1, 100, 2, 200]);
    }

    // -- Fatal errors --

    #[test]
    fn directory_failure_aborts_with_room_context() {
        let directory = MapDirectory {
            fail: true,
            ..MapDirectory::default()
        };
        let rooms = [room(&["t1"], "c", &[], &[])];

        let err = resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls)
            .unwrap_err();
        match err {
            ResolveError::Directory { venue, venue_id, .. } => {
                assert_eq!(venue, "Room A");
                assert_eq!(venue_id, "v1");
            }
            other => panic!("expected Directory error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_handle_aborts() {
        let directory = MapDirectory::default().person("c", "not-a-snowflake", "");
        let rooms = [room(&[], "c", &[], &[])];

        let err = resolve_draw(&rooms, &venues(), &Categories::default(), &directory, &KeyUrls)
            .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedHandle { .. }));
        assert!(err.to_string().contains("Room A"));
    }

    #[test]
    fn no_rooms_no_messages() {
        let messages = resolve_draw(
            &[],
            &venues(),
            &Categories::default(),
            &MapDirectory::default(),
            &KeyUrls,
        )
        .unwrap();
        assert!(messages.is_empty());
    }
}
