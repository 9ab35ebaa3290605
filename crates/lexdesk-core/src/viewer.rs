//! Case-document viewer: the modal that owns a search navigator.

use tracing::info;

use crate::search::SearchState;

struct OpenDocument {
    title: String,
    search: SearchState,
}

/// Holds at most one open document and its search state.
///
/// Closing the viewer discards the search state; reopening starts from an
/// empty query.
#[derive(Default)]
pub struct DocumentViewer {
    open: Option<OpenDocument>,
}

impl DocumentViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `html` under `title`, replacing any document already open.
    pub fn open(&mut self, title: impl Into<String>, html: impl Into<String>) {
        let title = title.into();
        let search = SearchState::new(html);
        info!(title = %title, bytes = search.text().len(), "document opened");
        self.open = Some(OpenDocument { title, search });
    }

    pub fn close(&mut self) {
        if let Some(doc) = self.open.take() {
            info!(title = %doc.title, "document closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn title(&self) -> Option<&str> {
        self.open.as_ref().map(|d| d.title.as_str())
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.open.as_ref().map(|d| &d.search)
    }

    pub fn search_mut(&mut self) -> Option<&mut SearchState> {
        self.open.as_mut().map(|d| &mut d.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_by_default() {
        let viewer = DocumentViewer::new();
        assert!(!viewer.is_open());
        assert!(viewer.search().is_none());
    }

    #[test]
    fn close_clears_search_state() {
        let mut viewer = DocumentViewer::new();
        viewer.open("Judgment", "<p>The writ was served.</p>");
        viewer.search_mut().unwrap().set_query("writ");
        assert_eq!(viewer.search().unwrap().match_count(), 1);

        viewer.close();
        assert!(!viewer.is_open());
        assert!(viewer.search_mut().is_none());

        viewer.open("Judgment", "<p>The writ was served.</p>");
        let search = viewer.search().unwrap();
        assert_eq!(search.query(), "");
        assert_eq!(search.match_count(), 0);
    }

    #[test]
    fn open_replaces_previous_document() {
        let mut viewer = DocumentViewer::new();
        viewer.open("First", "alpha");
        viewer.open("Second", "beta");
        assert_eq!(viewer.title(), Some("Second"));
        assert_eq!(viewer.search().unwrap().text(), "beta");
    }
}
