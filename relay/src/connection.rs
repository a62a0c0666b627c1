//! Relay connection response shapes.

use serde::{Deserialize, Serialize};

/// One page of items as returned by storage, in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_next_page: false,
            has_previous_page: false,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

/// A paginated list with its page info and the total number of items in the
/// unpaginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    pub total_count: i64,
}

impl<T> Connection<T> {
    /// Builds a connection from a storage page, computing each edge's cursor
    /// with `cursor_of`.
    pub fn from_page(page: Page<T>, total_count: i64, cursor_of: impl Fn(&T) -> String) -> Self {
        let edges: Vec<Edge<T>> = page
            .items
            .into_iter()
            .map(|node| Edge {
                cursor: cursor_of(&node),
                node,
            })
            .collect();

        let page_info = PageInfo {
            has_next_page: page.has_next_page,
            has_previous_page: page.has_previous_page,
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };

        Self {
            edges,
            page_info,
            total_count,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Connection<U> {
        Connection {
            edges: self
                .edges
                .into_iter()
                .map(|edge| Edge {
                    cursor: edge.cursor,
                    node: f(edge.node),
                })
                .collect(),
            page_info: self.page_info,
            total_count: self.total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_page_sets_start_and_end_cursor() {
        let page = Page {
            items: vec![1, 2, 3],
            has_next_page: true,
            has_previous_page: false,
        };
        let connection = Connection::from_page(page, 10, |n| format!("c{n}"));

        assert_eq!(connection.edges.len(), 3);
        assert_eq!(connection.page_info.start_cursor.as_deref(), Some("c1"));
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("c3"));
        assert!(connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
        assert_eq!(connection.total_count, 10);
    }

    #[test]
    fn test_empty_page_has_no_cursors() {
        let connection = Connection::<i32>::from_page(Page::empty(), 0, |n| n.to_string());
        assert!(connection.edges.is_empty());
        assert_eq!(connection.page_info.start_cursor, None);
        assert_eq!(connection.page_info.end_cursor, None);
    }

    #[test]
    fn test_map_keeps_cursors() {
        let page = Page {
            items: vec![1, 2],
            has_next_page: false,
            has_previous_page: true,
        };
        let connection = Connection::from_page(page, 2, |n| n.to_string()).map(|n| n * 10);
        assert_eq!(connection.edges[1].node, 20);
        assert_eq!(connection.edges[1].cursor, "2");
    }
}
