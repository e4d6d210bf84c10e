//! Plain data types shared by the parsers and the expander.

pub mod alternative;
pub mod die;
pub mod table_name;
