//! Member-facing material viewer.
//!
//! The viewer holds the material list, the current selection and what is
//! being displayed for it. Selection is gated by rank: a locked entry can be
//! listed but never selected by the member. Detail fetches are tagged with a
//! generation number and only the latest selection's result is displayed, so
//! a slow response for an earlier selection cannot overwrite a newer one.

use crate::Error;
use crate::source::ContentSource;
use policy::{Decision, Rank};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storage::{Material, MaterialId, MaterialSummary, Member};
use tracing::{debug, info, warn};

/// What to select after the list loads while nothing is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSelect {
    /// The first listed material. When it is locked for the member the view
    /// shows [`ViewState::Locked`] and nothing is fetched.
    #[default]
    First,
    /// The first material the member may open.
    FirstUnlocked,
    /// Leave the selection empty.
    None,
}

/// Why the material list could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("please log in to view training materials")]
    Unauthorized,

    #[error("failed to load training materials: {0}")]
    Failed(String),
}

impl From<&Error> for ListError {
    fn from(err: &Error) -> Self {
        if err.is_unauthorized() {
            ListError::Unauthorized
        } else {
            ListError::Failed(err.to_string())
        }
    }
}

/// State of the material list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(ListError),
}

/// What the detail pane shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    NoSelection,
    Loading {
        id: MaterialId,
    },
    Loaded(Material),
    /// The selection is above the member's rank; only its gating is shown.
    Locked {
        id: MaterialId,
        required: Rank,
        held: Rank,
    },
    LoadError {
        id: MaterialId,
        message: String,
    },
}

/// A rejected selection. The viewer state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("no material {0} in the list")]
    UnknownItem(MaterialId),

    #[error("material {id} requires {required}, member holds {held}")]
    Locked {
        id: MaterialId,
        required: Rank,
        held: Rank,
    },
}

/// What happened to a detail fetch once it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result is now displayed.
    Applied,
    /// A newer selection was made while the fetch was in flight.
    Superseded,
}

/// A list entry paired with its lock state for the viewing member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub material: MaterialSummary,
    pub locked: bool,
}

#[derive(Debug, Default)]
struct State {
    items: Vec<MaterialSummary>,
    list: ListState,
    view: ViewState,
    selected: Option<MaterialId>,
    generation: u64,
}

impl State {
    fn begin(&mut self, id: MaterialId) -> u64 {
        self.generation += 1;
        self.selected = Some(id.clone());
        self.view = ViewState::Loading { id };
        self.generation
    }

    fn lock_out(&mut self, id: MaterialId, required: Rank, held: Rank) {
        self.generation += 1;
        self.selected = Some(id.clone());
        self.view = ViewState::Locked { id, required, held };
    }
}

/// Rank-gated material viewer.
pub struct Viewer<S> {
    source: Arc<S>,
    member_rank: Option<Rank>,
    auto_select: AutoSelect,
    state: Arc<Mutex<State>>,
}

impl<S: ContentSource> Viewer<S> {
    /// Create a viewer for a member holding `member_rank`.
    ///
    /// `None` is a member without a rank, who may only open materials that
    /// require the lowest rank.
    pub fn new(source: S, member_rank: Option<Rank>) -> Self {
        Self::with_shared_source(Arc::new(source), member_rank)
    }

    /// Create a viewer over a source shared with other users.
    pub fn with_shared_source(source: Arc<S>, member_rank: Option<Rank>) -> Self {
        Self {
            source,
            member_rank,
            auto_select: AutoSelect::default(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Create a viewer for `member`.
    pub fn for_member(source: S, member: &Member) -> Self {
        Self::new(source, member.rank)
    }

    pub fn with_auto_select(mut self, auto_select: AutoSelect) -> Self {
        self.auto_select = auto_select;
        self
    }

    pub fn member_rank(&self) -> Option<Rank> {
        self.member_rank
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Access decision for one material.
    pub fn decide(&self, material: &MaterialSummary) -> Decision {
        policy::check(material.required_rank, self.member_rank)
    }

    pub fn is_locked(&self, material: &MaterialSummary) -> bool {
        self.decide(material).is_locked()
    }

    /// Load (or reload) the material list.
    ///
    /// On success, if nothing is selected yet, the auto-selection policy is
    /// applied and the detail fetch it started is returned. A locked
    /// auto-selection moves the view to [`ViewState::Locked`] without a fetch.
    /// Failures are kept in [`ListState::Failed`] and also returned; the
    /// previous list is cleared so nothing from it can be selected.
    pub async fn load_list(
        &self,
        search: Option<&str>,
    ) -> Result<Option<PendingFetch<S>>, ListError> {
        self.state().list = ListState::Loading;

        let result = self.source.list(search).await;

        let mut state = self.state();
        let items = match result {
            Ok(items) => items,
            Err(err) => {
                warn!(error = %err, "material list failed");
                let list_error = ListError::from(&err);
                state.items.clear();
                state.list = ListState::Failed(list_error.clone());
                return Err(list_error);
            }
        };

        info!(count = items.len(), "material list loaded");
        state.items = items;
        state.list = ListState::Loaded;

        if state.selected.is_some() {
            return Ok(None);
        }

        let pick = match self.auto_select {
            AutoSelect::First => state.items.first(),
            AutoSelect::FirstUnlocked => state.items.iter().find(|m| !self.is_locked(m)),
            AutoSelect::None => None,
        };
        let Some((id, decision)) = pick.map(|m| (m.id.clone(), self.decide(m))) else {
            return Ok(None);
        };

        if let Decision::Deny { required, held } = decision {
            debug!(%id, %required, %held, "auto-selected material is locked");
            state.lock_out(id, required, held);
            return Ok(None);
        }

        debug!(%id, "auto-selecting material");
        let generation = state.begin(id.clone());
        Ok(Some(self.pending(generation, id)))
    }

    /// Select a material for display.
    ///
    /// Locked or unknown materials are rejected without touching the current
    /// selection or what is displayed.
    pub fn select(&self, id: &MaterialId) -> Result<PendingFetch<S>, SelectError> {
        let mut state = self.state();
        let Some(material) = state.items.iter().find(|m| &m.id == id) else {
            return Err(SelectError::UnknownItem(id.clone()));
        };

        if let Decision::Deny { required, held } = self.decide(material) {
            debug!(%id, %required, %held, "selection rejected");
            return Err(SelectError::Locked {
                id: id.clone(),
                required,
                held,
            });
        }

        let generation = state.begin(id.clone());
        Ok(self.pending(generation, id.clone()))
    }

    fn pending(&self, generation: u64, id: MaterialId) -> PendingFetch<S> {
        PendingFetch {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            member_rank: self.member_rank,
            generation,
            id,
        }
    }

    pub fn list_state(&self) -> ListState {
        self.state().list.clone()
    }

    pub fn view(&self) -> ViewState {
        self.state().view.clone()
    }

    pub fn selected(&self) -> Option<MaterialId> {
        self.state().selected.clone()
    }

    /// Whether the view holds a locked selection instead of its detail.
    pub fn selected_is_locked(&self) -> bool {
        matches!(self.state().view, ViewState::Locked { .. })
    }

    /// The list with each entry's lock state.
    pub fn entries(&self) -> Vec<Entry> {
        self.state()
            .items
            .iter()
            .map(|m| Entry {
                locked: self.is_locked(m),
                material: m.clone(),
            })
            .collect()
    }
}

/// A detail fetch started by a selection.
///
/// Nothing is fetched until [`PendingFetch::run`] is awaited. Dropping it
/// leaves the viewer in [`ViewState::Loading`] for that selection.
#[must_use = "the detail is only fetched when the pending fetch is run"]
pub struct PendingFetch<S> {
    source: Arc<S>,
    state: Arc<Mutex<State>>,
    member_rank: Option<Rank>,
    generation: u64,
    id: MaterialId,
}

impl<S: ContentSource> PendingFetch<S> {
    pub fn id(&self) -> &MaterialId {
        &self.id
    }

    /// Fetch the detail and display it if this is still the latest selection.
    ///
    /// The fetched material's own required rank is checked again; a material
    /// whose detail requires more than the member holds is shown as
    /// [`ViewState::Locked`].
    pub async fn run(self) -> FetchOutcome {
        let result = self.source.fetch(&self.id).await;

        let mut state = lock(&self.state);
        if state.generation != self.generation {
            debug!(id = %self.id, "discarding superseded detail fetch");
            return FetchOutcome::Superseded;
        }

        state.view = match result {
            Ok(material) => match policy::check(material.required_rank, self.member_rank) {
                Decision::Allow => ViewState::Loaded(material),
                Decision::Deny { required, held } => {
                    warn!(id = %self.id, %required, %held, "fetched material is above member rank");
                    ViewState::Locked {
                        id: self.id.clone(),
                        required,
                        held,
                    }
                }
            },
            Err(err) => {
                warn!(id = %self.id, error = %err, "material detail failed");
                ViewState::LoadError {
                    id: self.id.clone(),
                    message: err.to_string(),
                }
            }
        };
        FetchOutcome::Applied
    }
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
