//! Transient UI selection: which tab is open and what is selected in it.
//!
//! Holds ids only, never domain data; the aggregate store never reads it.

/// Top-level screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Dashboard,
    Upload,
    Autofill,
    List,
    Profile,
}

impl Tab {
    /// Screens that start from a blank selection.
    #[must_use]
    pub fn starts_fresh(self) -> bool {
        matches!(self, Self::Upload | Self::Autofill)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationContext {
    tab: Tab,
    provider_id: Option<String>,
    pdf_id: Option<i64>,
}

impl NavigationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tab(&self) -> Tab {
        self.tab
    }

    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    #[must_use]
    pub fn pdf_id(&self) -> Option<i64> {
        self.pdf_id
    }

    /// Switch tabs. Upload and Autofill clear the selection.
    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab.starts_fresh() {
            self.clear_selection();
        }
    }

    /// Select a provider; a different provider drops the PDF selection.
    pub fn select_provider(&mut self, provider_id: Option<&str>) {
        if self.provider_id.as_deref() != provider_id {
            self.pdf_id = None;
        }
        self.provider_id = provider_id.map(str::to_owned);
    }

    pub fn select_pdf(&mut self, pdf_id: Option<i64>) {
        self.pdf_id = pdf_id;
    }

    /// Open a provider's profile.
    pub fn view_profile(&mut self, provider_id: &str) {
        self.select_provider(Some(provider_id));
        self.tab = Tab::Profile;
    }

    pub fn clear_selection(&mut self) {
        self.provider_id = None;
        self.pdf_id = None;
    }
}

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;
