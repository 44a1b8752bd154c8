pub mod api_info;
pub mod help;
pub mod referral;
pub mod start;
pub mod trial;
