//! REST routes, relative to `{base}/api/{version}`.

pub mod v1 {
    pub const SHORTS: &str = "/shorts";
    pub const REPORTS: &str = "/reports";

    pub mod videos {
        pub fn reaction(item_id: &str) -> String {
            format!("/videos/{item_id}/reaction")
        }

        pub fn comments(item_id: &str) -> String {
            format!("/videos/{item_id}/comments")
        }
    }

    pub mod comments {
        pub fn reaction(comment_id: &str) -> String {
            format!("/comments/{comment_id}/reaction")
        }
    }

    pub mod creators {
        pub fn block(creator_id: &str) -> String {
            format!("/creators/{creator_id}/block")
        }
    }
}

/// Percent-encode a path segment taken from server-provided ids.
pub fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
