use serde::{Deserialize, Serialize};

/// One record of the posts collection.
///
/// Extra fields sent by the server (such as `userId`) are ignored; the three
/// fields below are required.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
}
