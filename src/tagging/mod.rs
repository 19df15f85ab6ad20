mod hashtags;

pub use hashtags::{
    ensure_hashtag, link_hashtags, normalize_hashtag, parse_hashtags, HashtagId, LinkedHashtag,
    TaggingError,
};
