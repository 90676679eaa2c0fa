//! Replays key presses against a review session.

use crate::command_id::CommandId;
use crate::keymap::Keymap;
use log::{debug, warn};
use review_engine::{
    Direction, HashSynchronizer, MemoryHistory, NavRequest, ReviewAction, ReviewSession,
};
use std::sync::Arc;

pub struct Replay<'a> {
    session: &'a ReviewSession,
    sync: Arc<HashSynchronizer>,
    history: Arc<MemoryHistory>,
    keymap: Keymap,
    page_jump: usize,
}

impl<'a> Replay<'a> {
    pub fn new(
        session: &'a ReviewSession,
        sync: Arc<HashSynchronizer>,
        history: Arc<MemoryHistory>,
        keymap: Keymap,
        page_jump: usize,
    ) -> Self {
        Self {
            session,
            sync,
            history,
            keymap,
            page_jump,
        }
    }

    fn dispatch(&self, action: ReviewAction) {
        self.session.store().dispatch(action);
    }

    /// Replay every key of `keys`, then close an unfinished goto prompt.
    pub async fn run(&self, keys: &str) {
        for key in keys.chars() {
            self.press(key).await;
        }
        self.finish();
    }

    pub async fn press(&self, key: char) {
        if self.session.store().get_snapshot().goto.is_some() {
            if key.is_ascii_digit() {
                self.dispatch(ReviewAction::GotoInput(key));
                return;
            }
            self.dispatch(ReviewAction::CommitGoto);
        }

        match self.keymap.command_for(key) {
            Some(command) => self.execute(command).await,
            None => debug!("Unbound key {:?}", key),
        }
    }

    /// Commit a goto prompt left open by the last key.
    pub fn finish(&self) {
        if self.session.store().get_snapshot().goto.is_some() {
            self.dispatch(ReviewAction::CommitGoto);
        }
    }

    async fn execute(&self, command: CommandId) {
        debug!("Executing {:?}", command);
        match command {
            CommandId::NavigateDown => self.navigate(NavRequest::step(Direction::Down)),
            CommandId::NavigateUp => self.navigate(NavRequest::step(Direction::Up)),
            CommandId::PageDown => self.navigate(NavRequest::page(Direction::Down, self.page_jump)),
            CommandId::PageUp => self.navigate(NavRequest::page(Direction::Up, self.page_jump)),
            CommandId::NavigateLeft => self.navigate(NavRequest::step(Direction::Left)),
            CommandId::NavigateRight => self.navigate(NavRequest::step(Direction::Right)),
            CommandId::ExtendSelectionDown => self.navigate(NavRequest::extend(Direction::Down)),
            CommandId::ExtendSelectionUp => self.navigate(NavRequest::extend(Direction::Up)),
            CommandId::ClearFocus => self.dispatch(ReviewAction::ClearFocus),
            CommandId::FileNext => {
                self.session.select_next_file().await;
            }
            CommandId::FilePrevious => {
                self.session.select_previous_file().await;
            }
            CommandId::FileNextUnviewed => {
                self.session.select_next_unviewed_file().await;
            }
            CommandId::FileToggleViewed => {
                if let Some(path) = self.session.store().get_snapshot().selected_file.clone() {
                    self.dispatch(ReviewAction::ToggleViewed(path));
                }
            }
            CommandId::ToggleDiffViewMode => {
                let mode = self.session.store().get_snapshot().diff_view_mode.toggle();
                self.dispatch(ReviewAction::SetDiffViewMode(mode));
            }
            CommandId::ExpandSkipBlock => {
                let focus = self.session.store().get_snapshot().focus;
                if let Some(index) = focus.focused_skip_block() {
                    if let Err(e) = self.session.expand_skip_block(index).await {
                        warn!("Failed to expand skip block {}: {:#}", index, e);
                    }
                }
            }
            CommandId::GotoLine => self.dispatch(ReviewAction::EnterGotoMode),
            CommandId::StartCommenting => self.dispatch(ReviewAction::StartCommenting),
            CommandId::HistoryBack => {
                if let Some(link) = self.history.back() {
                    self.follow(&link).await;
                }
            }
            CommandId::HistoryForward => {
                if let Some(link) = self.history.forward() {
                    self.follow(&link).await;
                }
            }
        }
    }

    fn navigate(&self, request: NavRequest) {
        self.dispatch(ReviewAction::Navigate(request));
    }

    async fn follow(&self, link: &str) {
        if self.sync.navigate_from_hash(link) {
            self.session.load_selected().await;
        }
    }
}
