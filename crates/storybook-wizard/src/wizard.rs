//! Wizard orchestration
//!
//! State lives behind a mutex that is never held across an await. Every async
//! operation snapshots the session generation first; `enter_book` and `reset`
//! bump it, and a result that comes back for an older generation is dropped
//! instead of being applied to the new session.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use storybook_api_client::{PhotoUpload, ProgressCallback, StorefrontApi};
use storybook_core::models::{
    AddCartItemRequest, Book, ChildInfo, PendingPersonalization, PersonalizationDraft,
};
use storybook_core::validation::PhotoPolicy;
use storybook_core::{AppError, ErrorMetadata, StorefrontConfig, ValidationError};
use storybook_query::{QueryClient, QueryKey};
use storybook_storage::{
    clear_pending_personalization, load_pending_personalization, save_pending_personalization,
    GuestStore,
};

use crate::auth::{AuthContext, AuthProvider};
use crate::form::ChildInfoForm;
use crate::photo::{parse_remote_url, validate_photo, PhotoArtifact, PhotoState, PreviewRegistry, UploadStatus};
use crate::state::{Phase, Route, WizardStep};

const DEFAULT_UPLOAD_HOLD: Duration = Duration::from_millis(500);

/// Result of a successful child-info submission. The wizard is on the preview
/// step in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new server draft was created.
    Persisted { draft_id: String },
    /// Guest path: the payload was written to the guest store.
    SavedAsGuest,
    /// Nothing was persisted; the preview runs from local form data and the
    /// draft is created again at add-to-cart time.
    Unpersisted { message: String },
}

struct Session {
    generation: u64,
    slug: Option<String>,
    book: Option<Book>,
    auth: AuthContext,
    /// Set after the server rejected the session during this wizard session.
    degraded_to_guest: bool,
    phase: Phase,
    form: ChildInfoForm,
    photo: PhotoState,
}

impl Session {
    fn is_guest(&self) -> bool {
        !self.auth.is_authenticated || self.degraded_to_guest
    }

    fn reset(&mut self, phase: Phase) {
        self.phase = phase;
        self.form = self
            .book
            .as_ref()
            .map(ChildInfoForm::for_book)
            .unwrap_or_default();
        self.photo.clear();
        self.degraded_to_guest = false;
    }

    fn ensure_child_info(&self, operation: &'static str) -> Result<(), AppError> {
        match &self.phase {
            Phase::ChildInfo { .. } => Ok(()),
            phase if phase.is_busy() => Err(AppError::Busy(operation)),
            phase => Err(AppError::StateInconsistency(format!(
                "{} is only possible on the child-info step (current step: {})",
                operation,
                phase.step()
            ))),
        }
    }

    fn ensure_editing(&self, operation: &'static str) -> Result<(), AppError> {
        self.ensure_child_info(operation)?;
        if self.photo.is_uploading() {
            return Err(AppError::Busy("photo upload"));
        }
        Ok(())
    }

    fn upload_target(&self) -> Option<String> {
        if self.is_guest() {
            return None;
        }
        match &self.phase {
            Phase::ChildInfo {
                draft: Some(draft), ..
            } if draft.is_persisted() => Some(draft.id.clone()),
            _ => None,
        }
    }
}

/// The personalization wizard for one book at a time.
pub struct Wizard {
    api: Arc<dyn StorefrontApi>,
    queries: QueryClient,
    guest_store: Arc<dyn GuestStore>,
    auth: Arc<dyn AuthProvider>,
    previews: PreviewRegistry,
    photo_policy: PhotoPolicy,
    upload_hold: Duration,
    session: Arc<Mutex<Session>>,
}

impl Wizard {
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        queries: QueryClient,
        guest_store: Arc<dyn GuestStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let session = Session {
            generation: 0,
            slug: None,
            book: None,
            auth: auth.snapshot(),
            degraded_to_guest: false,
            phase: Phase::Book,
            form: ChildInfoForm::default(),
            photo: PhotoState::default(),
        };

        Self {
            api,
            queries,
            guest_store,
            auth,
            previews: PreviewRegistry::new(),
            photo_policy: PhotoPolicy::default(),
            upload_hold: DEFAULT_UPLOAD_HOLD,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Apply photo limits and upload timing from configuration.
    pub fn with_config(mut self, config: &StorefrontConfig) -> Self {
        self.photo_policy = config.photo_policy.clone();
        self.upload_hold = config.upload_complete_hold;
        self
    }

    pub fn with_upload_hold(mut self, hold: Duration) -> Self {
        self.upload_hold = hold;
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock the session if it is still the one `generation` was taken from.
    fn current(&self, generation: u64) -> Result<MutexGuard<'_, Session>, AppError> {
        let session = self.session();
        if session.generation != generation {
            tracing::debug!(
                started = generation,
                current = session.generation,
                "Discarding result for a replaced wizard session"
            );
            return Err(AppError::StateInconsistency(
                "The personalization session was replaced".to_string(),
            ));
        }
        Ok(session)
    }

    fn ensure_current(&self, generation: u64) -> Result<(), AppError> {
        self.current(generation).map(|_| ())
    }

    // ----- read access -----

    pub fn phase(&self) -> Phase {
        self.session().phase.clone()
    }

    pub fn step(&self) -> WizardStep {
        self.session().phase.step()
    }

    pub fn book(&self) -> Option<Book> {
        self.session().book.clone()
    }

    pub fn form(&self) -> ChildInfoForm {
        self.session().form.clone()
    }

    /// Validated form data the preview renders from.
    pub fn form_data(&self) -> Option<ChildInfo> {
        self.session().phase.form().cloned()
    }

    pub fn current_draft(&self) -> Option<PersonalizationDraft> {
        self.session().phase.draft().cloned()
    }

    pub fn photo_status(&self) -> UploadStatus {
        self.session().photo.status()
    }

    pub fn photo_url(&self) -> Option<String> {
        self.session().photo.photo_url()
    }

    pub fn photo_preview_url(&self) -> Option<String> {
        self.session().photo.preview_url()
    }

    pub fn is_guest(&self) -> bool {
        self.session().is_guest()
    }

    pub fn is_uploading_photo(&self) -> bool {
        self.session().photo.is_uploading()
    }

    pub fn is_creating_personalization(&self) -> bool {
        self.session().phase.is_creating_personalization()
    }

    pub fn is_adding_to_cart(&self) -> bool {
        self.session().phase.is_adding_to_cart()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    // ----- session lifecycle -----

    /// Start a fresh session for `slug`, discarding everything from the previous
    /// one, and load the book. Lands on the child-info step.
    pub async fn enter_book(&self, slug: &str) -> Result<Book, AppError> {
        let generation = {
            let mut session = self.session();
            session.generation += 1;
            session.slug = Some(slug.to_string());
            session.book = None;
            session.auth = self.auth.snapshot();
            session.reset(Phase::Book);
            session.generation
        };
        tracing::info!(slug = %slug, generation, "Starting personalization");

        let api = self.api.clone();
        let owned_slug = slug.to_string();
        let book = self
            .queries
            .fetch(QueryKey::book(slug), move || async move {
                api.get_book(&owned_slug).await
            })
            .await?;

        let mut session = self.current(generation)?;
        session.book = Some(book.clone());
        session.form = ChildInfoForm::for_book(&book);
        session.phase = Phase::ChildInfo {
            prefill: None,
            draft: None,
        };
        Ok(book)
    }

    /// Clear draft, form and photo state, keeping the loaded book.
    pub fn reset(&self) {
        let mut session = self.session();
        session.generation += 1;
        let phase = if session.book.is_some() {
            Phase::ChildInfo {
                prefill: None,
                draft: None,
            }
        } else {
            Phase::Book
        };
        session.reset(phase);
    }

    // ----- step 1: child info -----

    pub fn edit_form<F>(&self, edit: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut ChildInfoForm),
    {
        let mut session = self.session();
        session.ensure_child_info("form editing")?;
        edit(&mut session.form);
        Ok(())
    }

    /// Accept a picked or dropped photo file.
    ///
    /// The preview is available immediately. Without a server draft the bytes are
    /// kept inline; with one they are uploaded right away.
    pub async fn select_photo(&self, photo: PhotoUpload) -> Result<(), AppError> {
        validate_photo(&photo, &self.photo_policy)?;

        let (generation, draft_id) = {
            let mut session = self.session();
            session.ensure_editing("photo selection")?;
            let preview = self.previews.create(&photo);
            match session.upload_target() {
                Some(draft_id) => {
                    session.photo.begin_upload(preview);
                    (session.generation, draft_id)
                }
                None => {
                    session.photo.set_inline(preview, photo);
                    return Ok(());
                }
            }
        };

        let progress: ProgressCallback = {
            let session = self.session.clone();
            Arc::new(move |percent| {
                let mut session = session
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if session.generation == generation {
                    session.photo.report_progress(percent);
                }
            })
        };

        tracing::debug!(personalization_id = %draft_id, size = photo.size(), "Uploading child photo");
        let retained = photo.clone();
        match self.api.upload_photo(&draft_id, photo, Some(progress)).await {
            Ok(response) => {
                {
                    let mut session = self.current(generation)?;
                    session.photo.complete_upload(response.photo_url);
                    if let Phase::ChildInfo { draft, .. } = &mut session.phase {
                        *draft = Some(response.personalization);
                    }
                }
                self.schedule_upload_hold(generation);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Session rejected during photo upload, keeping photo locally");
                let mut session = self.current(generation)?;
                session.degraded_to_guest = true;
                let preview = self.previews.create(&retained);
                session.photo.set_inline(preview, retained);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Photo upload failed");
                if let Ok(mut session) = self.current(generation) {
                    session.photo.clear();
                }
                Err(e)
            }
        }
    }

    fn schedule_upload_hold(&self, generation: u64) {
        if self.upload_hold.is_zero() {
            self.session().photo.finish_hold();
            return;
        }

        let session = self.session.clone();
        let hold = self.upload_hold;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            let mut session = session
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if session.generation == generation {
                session.photo.finish_hold();
            }
        });
    }

    /// Use a pasted photo URL instead of a file.
    pub fn select_photo_url(&self, url: &str) -> Result<(), AppError> {
        let url = parse_remote_url(url)?;
        let mut session = self.session();
        session.ensure_editing("photo selection")?;
        session.photo.set_remote(url);
        Ok(())
    }

    pub fn remove_photo(&self) -> Result<(), AppError> {
        let mut session = self.session();
        session.ensure_editing("photo removal")?;
        session.photo.clear();
        Ok(())
    }

    /// Validate the form and persist it: a new server draft when signed in, the
    /// guest store otherwise. Moves to the preview step unless validation fails.
    pub async fn submit_child_info(&self) -> Result<SubmitOutcome, AppError> {
        let (generation, book, slug, child, inline_photo, guest) = {
            let mut session = self.session();
            session.ensure_editing("child-info submission")?;
            let book = session.book.clone().ok_or_else(|| {
                AppError::StateInconsistency("No book is loaded".to_string())
            })?;
            let photo_url = session.photo.photo_url();
            let child = session.form.validate(photo_url.as_deref(), &book)?;
            let inline_photo = session
                .photo
                .artifact()
                .and_then(PhotoArtifact::as_inline)
                .cloned();
            let slug = session.slug.clone().unwrap_or_else(|| book.slug.clone());
            session.phase = Phase::SubmittingChildInfo {
                form: child.clone(),
            };
            (session.generation, book, slug, child, inline_photo, session.is_guest())
        };

        if guest {
            return self.save_as_guest(generation, &book, &slug, child).await;
        }

        let request = child.to_create_request(&book.id);
        match self.api.create_personalization(&request).await {
            Ok(draft) => {
                self.ensure_current(generation)?;
                tracing::info!(personalization_id = %draft.id, book_id = %book.id, "Personalization draft created");

                let (draft, child) = match inline_photo {
                    Some(photo) => self.migrate_inline_photo(generation, draft, child, photo).await?,
                    None => (draft, child),
                };
                let draft_id = draft.id.clone();

                let mut session = self.current(generation)?;
                session.phase = Phase::Preview {
                    form: child,
                    draft: Some(draft),
                };
                Ok(SubmitOutcome::Persisted { draft_id })
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Session rejected while saving personalization, continuing as guest");
                {
                    let mut session = self.current(generation)?;
                    session.degraded_to_guest = true;
                }
                self.save_as_guest(generation, &book, &slug, child).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not create personalization draft, continuing with local data");
                let mut session = self.current(generation)?;
                session.phase = Phase::Preview {
                    form: child,
                    draft: None,
                };
                Ok(SubmitOutcome::Unpersisted {
                    message: e.client_message(),
                })
            }
        }
    }

    /// Move an inline photo onto the freshly created draft. Best effort: on
    /// failure the draft keeps the inline URL.
    async fn migrate_inline_photo(
        &self,
        generation: u64,
        draft: PersonalizationDraft,
        mut child: ChildInfo,
        photo: PhotoUpload,
    ) -> Result<(PersonalizationDraft, ChildInfo), AppError> {
        match self.api.upload_photo(&draft.id, photo, None).await {
            Ok(response) => {
                let mut session = self.current(generation)?;
                session.photo.complete_upload(response.photo_url.clone());
                session.photo.finish_hold();
                child.child_photo_url = response.photo_url;
                Ok((response.personalization, child))
            }
            Err(e) => {
                tracing::warn!(
                    personalization_id = %draft.id,
                    error = %e,
                    "Photo migration failed, keeping inline photo on draft"
                );
                Ok((draft, child))
            }
        }
    }

    async fn save_as_guest(
        &self,
        generation: u64,
        book: &Book,
        slug: &str,
        child: ChildInfo,
    ) -> Result<SubmitOutcome, AppError> {
        self.ensure_current(generation)?;
        let pending = PendingPersonalization::new(&book.id, slug, child.clone());
        let previous = load_pending_personalization(self.guest_store.as_ref())
            .await
            .ok()
            .flatten();
        let saved = save_pending_personalization(self.guest_store.as_ref(), &pending).await;

        if saved.is_ok() && self.ensure_current(generation).is_err() {
            self.undo_guest_save(&pending, previous).await;
        }

        let outcome = match saved {
            Ok(()) => {
                tracing::info!(book_id = %book.id, "Personalization saved for guest checkout");
                SubmitOutcome::SavedAsGuest
            }
            Err(e) => {
                let e = AppError::from(e);
                tracing::warn!(error = %e, "Could not save guest personalization");
                SubmitOutcome::Unpersisted {
                    message: e.client_message(),
                }
            }
        };

        let mut session = self.current(generation)?;
        session.phase = Phase::Preview {
            form: child,
            draft: None,
        };
        Ok(outcome)
    }

    /// Put the slot back the way it was if it still holds `written`.
    async fn undo_guest_save(
        &self,
        written: &PendingPersonalization,
        previous: Option<PendingPersonalization>,
    ) {
        let store = self.guest_store.as_ref();
        match load_pending_personalization(store).await {
            Ok(Some(current)) if &current == written => {}
            _ => return,
        }

        let restored = match &previous {
            Some(prev) => save_pending_personalization(store, prev).await,
            None => clear_pending_personalization(store).await,
        };
        match restored {
            Ok(()) => tracing::debug!(
                book_slug = %written.book_slug,
                "Session replaced during guest save, pending slot restored"
            ),
            Err(e) => tracing::warn!(error = %e, "Could not restore pending slot"),
        }
    }

    // ----- navigation -----

    /// Back from preview to the child-info form, reset to the submitted data.
    pub fn edit_information(&self) -> Result<(), AppError> {
        let mut session = self.session();
        let (prefill, draft) = match &session.phase {
            Phase::Preview { form, draft } => (Some(form.clone()), draft.clone()),
            Phase::Failed { form, draft, .. } => (
                form.clone()
                    .or_else(|| draft.as_ref().map(PersonalizationDraft::child_info)),
                draft.clone(),
            ),
            Phase::ChildInfo { .. } => return Ok(()),
            phase if phase.is_busy() => return Err(AppError::Busy("personalization")),
            _ => {
                return Err(AppError::StateInconsistency(
                    "No personalization to edit".to_string(),
                ))
            }
        };

        if let Some(info) = &prefill {
            session.form = ChildInfoForm::from_child_info(info);
            session.photo.rehydrate(&info.child_photo_url, &self.previews);
        }
        session.phase = Phase::ChildInfo { prefill, draft };
        Ok(())
    }

    /// Step-indicator navigation: the current step or an earlier one only.
    pub fn go_to_step(&self, target: WizardStep) -> Result<WizardStep, AppError> {
        let current = self.step();
        if !current.can_navigate_to(target) {
            return Err(ValidationError::field(
                "step",
                format!("Cannot jump ahead from {} to {}", current, target),
            )
            .into());
        }

        match target {
            _ if target == current => {}
            WizardStep::ChildInfo => self.edit_information()?,
            WizardStep::Book => {
                let mut session = self.session();
                if session.phase.is_busy() {
                    return Err(AppError::Busy("personalization"));
                }
                session.generation += 1;
                session.reset(Phase::Book);
            }
            WizardStep::Preview => {}
        }
        Ok(self.step())
    }

    // ----- add to cart -----

    /// Resolve a persisted draft and add it to the cart.
    ///
    /// Returns the route to show next: the cart on success, or the child-info
    /// step when there is no usable personalization data.
    pub async fn add_to_cart(&self) -> Result<Route, AppError> {
        let (generation, book_id, form, draft) = {
            let mut session = self.session();
            if session.phase.is_busy() {
                return Err(AppError::Busy("add to cart"));
            }
            if session.photo.is_uploading() {
                return Err(AppError::Busy("photo upload"));
            }

            let (form, draft) = match &session.phase {
                Phase::Preview { form, draft } => (Some(form.clone()), draft.clone()),
                Phase::Failed { form, draft, .. } => (form.clone(), draft.clone()),
                _ => (None, None),
            };
            let draft = draft.filter(|d| d.is_persisted() && d.is_complete());
            let form = form
                .or_else(|| draft.as_ref().map(PersonalizationDraft::child_info))
                .filter(ChildInfo::is_complete);

            let (Some(form), Some(book_id)) = (form, session.book.as_ref().map(|b| b.id.clone()))
            else {
                tracing::warn!(
                    step = %session.phase.step(),
                    "Add to cart without usable personalization data, returning to child info"
                );
                if !matches!(session.phase, Phase::ChildInfo { .. }) {
                    let prefill = session.phase.form().cloned();
                    session.phase = Phase::ChildInfo {
                        prefill,
                        draft: None,
                    };
                }
                return Ok(Route::Step(WizardStep::ChildInfo));
            };

            session.phase = match &draft {
                Some(draft) => Phase::AddingToCart {
                    form: form.clone(),
                    draft: draft.clone(),
                },
                None => Phase::RetryingDraft { form: form.clone() },
            };
            (session.generation, book_id, form, draft)
        };

        let draft = match draft {
            Some(draft) => draft,
            None => {
                tracing::info!(book_id = %book_id, "No personalization draft yet, retrying creation once");
                match self
                    .api
                    .create_personalization(&form.to_create_request(&book_id))
                    .await
                {
                    Ok(draft) => {
                        let mut session = self.current(generation)?;
                        session.phase = Phase::AddingToCart {
                            form: form.clone(),
                            draft: draft.clone(),
                        };
                        draft
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Personalization retry failed, not adding to cart");
                        self.fail(generation, &e, form, None);
                        return Err(e);
                    }
                }
            }
        };

        let language_code = if draft.language_code.trim().is_empty() {
            form.language_code.clone()
        } else {
            draft.language_code.clone()
        };
        let request = AddCartItemRequest {
            book_id,
            personalization_id: draft.id.clone(),
            quantity: 1,
            language_code,
        };

        match self.api.add_cart_item(&request).await {
            Ok(item) => {
                self.queries.invalidate("cart");
                tracing::info!(
                    cart_item_id = %item.id,
                    personalization_id = %draft.id,
                    "Personalized book added to cart"
                );

                let mut session = self.current(generation)?;
                session.generation += 1;
                session.reset(Phase::ChildInfo {
                    prefill: None,
                    draft: None,
                });
                Ok(Route::Cart)
            }
            Err(e) => {
                tracing::warn!(error = %e, personalization_id = %draft.id, "Add to cart failed");
                self.fail(generation, &e, form, Some(draft));
                Err(e)
            }
        }
    }

    fn fail(
        &self,
        generation: u64,
        error: &AppError,
        form: ChildInfo,
        draft: Option<PersonalizationDraft>,
    ) {
        if let Ok(mut session) = self.current(generation) {
            session.phase = Phase::Failed {
                reason: error.client_message(),
                form: Some(form),
                draft,
            };
        }
    }
}
