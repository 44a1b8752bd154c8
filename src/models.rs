// src/models.rs
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Row id assigned by the store on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "denied" => Ok(RequestStatus::Denied),
            other => Err(format!("unknown request status `{}`", other)),
        }
    }
}

/// The requester's identity and profile fields as Telegram reported them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub id: RequestId,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: RequestStatus,
}

/// A bot user with their subscription state
#[derive(Debug, Clone, PartialEq)]
pub struct DbUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub subscription_end: Option<DateTime<Utc>>,
    pub subscription_unlimited: bool,
    pub trial_claimed: bool,
}

impl DbUser {
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription_unlimited || self.subscription_end.is_some_and(|end| end > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> DbUser {
        DbUser {
            user_id: 1,
            username: None,
            first_name: Some("Ann".into()),
            last_name: None,
            is_admin: false,
            subscription_end: None,
            subscription_unlimited: false,
            trial_claimed: false,
        }
    }

    #[test]
    fn subscription_activity_follows_end_date() {
        let now = Utc::now();
        let mut u = user();
        assert!(!u.has_active_subscription(now));

        u.subscription_end = Some(now + Duration::hours(2));
        assert!(u.has_active_subscription(now));

        u.subscription_end = Some(now - Duration::hours(2));
        assert!(!u.has_active_subscription(now));

        u.subscription_unlimited = true;
        assert!(u.has_active_subscription(now));
    }

    #[test]
    fn status_strings_match_table_constraint() {
        for s in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Denied,
        ] {
            assert_eq!(s.as_str().parse::<RequestStatus>().unwrap(), s);
        }
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }
}
