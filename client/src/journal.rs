//! Paging through agent journals and game action logs.

use crate::{
    Error,
    service::{GameService, JournalDirection, JournalKind, Page},
};
use medot_core::listing::{JournalEntry, LogPage};

/// The sequence ID to start from to find the latest journal entry.
///
/// Kept within the range of integers exactly representable as `f64`.
pub const LATEST_SEQUENCE_ID: i64 = (1 << 53) - 1;

/// The number of action log entries per page.
pub const LOG_PAGE_SIZE: u32 = 25;

/// A journal entry along with the entry preceding it, for diffing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JournalView {
    /// The current entry.
    pub current: JournalEntry,
    /// The entry with the preceding sequence ID, if any.
    pub previous: Option<JournalEntry>,
}

/// A cursor over a journal of an agent.
#[derive(Debug)]
pub struct JournalCursor<'a> {
    service: &'a GameService,
    kind: JournalKind,
    agent_id: String,
    sequence_id: i64,
    current: Option<JournalView>,
}

impl<'a> JournalCursor<'a> {
    /// Creates a cursor positioned before the latest entry.
    #[must_use]
    pub fn new(
        service: &'a GameService,
        kind: JournalKind,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            kind,
            agent_id: agent_id.into(),
            sequence_id: LATEST_SEQUENCE_ID,
            current: None,
        }
    }

    /// Returns the kind of journal.
    #[must_use]
    pub fn kind(&self) -> JournalKind {
        self.kind
    }

    /// Returns the agent ID.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Returns the entry under the cursor, if any.
    #[must_use]
    pub fn current(&self) -> Option<&JournalView> {
        self.current.as_ref()
    }

    /// Moves to the latest entry.
    ///
    /// Returns `None` if the agent has no journal.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a request fails.
    pub async fn latest(&mut self) -> Result<Option<&JournalView>, Error> {
        self.sequence_id = LATEST_SEQUENCE_ID;
        self.current = None;
        self.walk(JournalDirection::Down).await
    }

    /// Moves to the next older entry.
    ///
    /// Stays in place and returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a request fails.
    pub async fn older(&mut self) -> Result<Option<&JournalView>, Error> {
        self.walk(JournalDirection::Down).await
    }

    /// Moves to the next newer entry.
    ///
    /// Stays in place and returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a request fails.
    pub async fn newer(&mut self) -> Result<Option<&JournalView>, Error> {
        self.walk(JournalDirection::Up).await
    }

    async fn walk(&mut self, direction: JournalDirection) -> Result<Option<&JournalView>, Error> {
        let Some(current) = self
            .service
            .journal_step(self.kind, direction, &self.agent_id, self.sequence_id)
            .await?
        else {
            return Ok(None);
        };

        let previous = self
            .service
            .journal_at(self.kind, &self.agent_id, current.sequence_id - 1)
            .await?;
        self.sequence_id = current.sequence_id;
        tracing::debug!(agent_id = %self.agent_id, sequence_id = self.sequence_id, "moved journal cursor");

        Ok(Some(&*self.current.insert(JournalView { current, previous })))
    }
}

/// A pager over the action log of a game.
#[derive(Debug)]
pub struct LogPager<'a> {
    service: &'a GameService,
    game_id: String,
    page_size: u32,
    page_index: u32,
    has_more: bool,
}

impl<'a> LogPager<'a> {
    /// Creates a pager positioned at the first page.
    #[must_use]
    pub fn new(service: &'a GameService, game_id: impl Into<String>, page_size: u32) -> Self {
        Self {
            service,
            game_id: game_id.into(),
            page_size,
            page_index: 0,
            has_more: false,
        }
    }

    /// Returns the 0-based index of the current page.
    #[must_use]
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    /// Returns the window of the current page.
    #[must_use]
    pub fn page(&self) -> Page {
        Page {
            limit: self.page_size,
            offset: self.page_index * self.page_size,
        }
    }

    /// Tests if there is a previous page.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    /// Tests if the last loaded page reported more entries after it.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.has_more
    }

    /// Loads the current page.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails.
    pub async fn load(&mut self) -> Result<LogPage, Error> {
        let page = self.service.logs_by_game(&self.game_id, self.page()).await?;
        self.has_more = page.has_more;
        Ok(page)
    }

    /// Loads the next page, or returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails, staying on the current page.
    pub async fn next_page(&mut self) -> Result<Option<LogPage>, Error> {
        if !self.has_more {
            return Ok(None);
        }
        self.turn(self.page_index + 1).await.map(Some)
    }

    /// Loads the previous page, or returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the request fails, staying on the current page.
    pub async fn prev_page(&mut self) -> Result<Option<LogPage>, Error> {
        if self.page_index == 0 {
            return Ok(None);
        }
        self.turn(self.page_index - 1).await.map(Some)
    }

    async fn turn(&mut self, page_index: u32) -> Result<LogPage, Error> {
        let old = self.page_index;
        self.page_index = page_index;
        let res = self.load().await;
        if res.is_err() {
            self.page_index = old;
        }
        res
    }
}
