//! Follower reconciliation.
//!
//! Accounts following the host get followed back; accounts the host follows
//! that no longer follow it get dropped.

use beacon_protocol::{IdentityToken, PeopleList};
use beacon_runtime::Platform;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// One follow-graph change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendAction {
	Add(String),
	Remove(String),
}

impl FriendAction {
	pub fn xuid(&self) -> &str {
		match self {
			Self::Add(xuid) | Self::Remove(xuid) => xuid,
		}
	}
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendSyncReport {
	pub added: Vec<String>,
	pub removed: Vec<String>,
	pub failed: Vec<FriendAction>,
}

impl FriendSyncReport {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty() && self.failed.is_empty()
	}
}

/// Plans the follow-graph changes for a followers listing.
///
/// Entries without an account id are ignored.
pub fn plan(people: &PeopleList) -> Vec<FriendAction> {
	people
		.people
		.iter()
		.filter(|person| !person.xuid.is_empty())
		.filter_map(|person| {
			if !person.is_following_caller {
				Some(FriendAction::Remove(person.xuid.clone()))
			} else if !person.is_followed_by_caller {
				Some(FriendAction::Add(person.xuid.clone()))
			} else {
				None
			}
		})
		.collect()
}

/// Fetches followers and applies the planned changes concurrently.
///
/// Only the listing failing is an error; individual add/remove failures are
/// logged and collected in the report.
pub async fn sync(platform: &dyn Platform, token: &IdentityToken) -> Result<FriendSyncReport> {
	let people = platform.get_followers(token).await.map_err(Error::FriendSync)?;
	let actions = plan(&people);
	if actions.is_empty() {
		return Ok(FriendSyncReport::default());
	}

	let results = join_all(actions.iter().map(|action| async move {
		match action {
			FriendAction::Add(xuid) => platform.add_friend(token, xuid).await,
			FriendAction::Remove(xuid) => platform.remove_friend(token, xuid).await,
		}
	}))
	.await;

	let mut report = FriendSyncReport::default();
	for (action, result) in actions.into_iter().zip(results) {
		match (result, action) {
			(Ok(()), FriendAction::Add(xuid)) => {
				debug!(target = "beacon.friends", %xuid, "followed back");
				report.added.push(xuid);
			}
			(Ok(()), FriendAction::Remove(xuid)) => {
				debug!(target = "beacon.friends", %xuid, "unfollowed");
				report.removed.push(xuid);
			}
			(Err(err), action) => {
				warn!(target = "beacon.friends", xuid = %action.xuid(), error = %err, "friend update failed");
				report.failed.push(action);
			}
		}
	}
	Ok(report)
}

#[cfg(test)]
mod tests {
	use beacon_protocol::Person;
	use beacon_runtime::fake::{FakePlatform, PlatformCall};

	use super::*;

	fn person(xuid: &str, following_me: bool, followed_by_me: bool) -> Person {
		Person {
			xuid: xuid.into(),
			is_following_caller: following_me,
			is_followed_by_caller: followed_by_me,
			..Default::default()
		}
	}

	fn token() -> IdentityToken {
		IdentityToken {
			owner_id: "1".into(),
			hash_secret: "h".into(),
			security_token: "t".into(),
			expires_at: u64::MAX,
		}
	}

	#[test]
	fn plans_follow_backs_and_removals() {
		let people = PeopleList {
			total_count: 4,
			people: vec![
				person("A", true, false),
				person("B", false, true),
				person("C", true, true),
				person("", true, false),
			],
		};
		assert_eq!(plan(&people), vec![FriendAction::Add("A".into()), FriendAction::Remove("B".into())]);
	}

	#[tokio::test]
	async fn sync_issues_planned_calls() {
		let platform = FakePlatform::new();
		platform.set_followers(PeopleList {
			total_count: 2,
			people: vec![person("A", true, false), person("B", false, true)],
		});

		let report = sync(&platform, &token()).await.unwrap();
		assert_eq!(report.added, vec!["A".to_string()]);
		assert_eq!(report.removed, vec!["B".to_string()]);
		assert_eq!(platform.count(|c| matches!(c, PlatformCall::AddFriend(x) if x == "A")), 1);
		assert_eq!(platform.count(|c| matches!(c, PlatformCall::RemoveFriend(x) if x == "B")), 1);
	}

	#[tokio::test]
	async fn listing_failure_is_reported() {
		let platform = FakePlatform::new();
		platform.fail_followers(true);
		assert!(matches!(sync(&platform, &token()).await, Err(Error::FriendSync(_))));
		assert_eq!(platform.calls(), vec![PlatformCall::GetFollowers]);
	}
}
