use hashbrown::HashMap;

use crate::types::CardId;

/// Topic label to card ids, each list kept in store order.
pub type TopicIndex = HashMap<String, Vec<CardId>>;
