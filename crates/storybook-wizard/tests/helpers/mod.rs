//! Recording fake of the storefront API and wizard fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storybook_api_client::{PhotoUpload, ProgressCallback, StorefrontApi};
use storybook_core::models::{
    AddCartItemRequest, Book, BookLanguage, BookPage, Cart, CartItem, CatalogFilters,
    CreatePersonalizationRequest, Gender, PersonalizationDraft, UpdatePersonalizationRequest,
    UploadPhotoResponse,
};
use storybook_core::AppError;
use storybook_query::QueryClient;
use storybook_storage::{GuestStore, MemoryGuestStore, StorageResult};
use storybook_wizard::{AuthContext, StaticAuth, Wizard};
use tokio::sync::Notify;

pub const SPACE_EXPLORER: &str = "space-explorer";
pub const DINO_ADVENTURE: &str = "dino-adventure";

#[derive(Default)]
struct FakeState {
    create_failures: VecDeque<u16>,
    upload_failures: VecDeque<u16>,
    cart_failures: VecDeque<u16>,
    create_requests: Vec<CreatePersonalizationRequest>,
    cart_requests: Vec<AddCartItemRequest>,
    uploads: Vec<String>,
    book_requests: usize,
    cart_reads: usize,
    list_requests: Vec<CatalogFilters>,
    drafts: HashMap<String, PersonalizationDraft>,
    cart: Cart,
    next_id: usize,
}

/// In-memory backend that records every call.
pub struct FakeApi {
    books: HashMap<String, Book>,
    state: Mutex<FakeState>,
    create_gate: Mutex<Option<Arc<Notify>>>,
}

fn error_for(status: u16) -> AppError {
    if status == 401 {
        AppError::Unauthorized("Token expired".to_string())
    } else {
        AppError::server(status, Some(format!("Backend returned {}", status)))
    }
}

impl FakeApi {
    pub fn new() -> Self {
        let books = [book("b-space", SPACE_EXPLORER), book("b-dino", DINO_ADVENTURE)]
            .into_iter()
            .map(|b| (b.slug.clone(), b))
            .collect();
        Self {
            books,
            state: Mutex::new(FakeState::default()),
            create_gate: Mutex::new(None),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail_next_create(&self, status: u16) {
        self.state().create_failures.push_back(status);
    }

    pub fn fail_next_upload(&self, status: u16) {
        self.state().upload_failures.push_back(status);
    }

    pub fn fail_next_cart_add(&self, status: u16) {
        self.state().cart_failures.push_back(status);
    }

    /// Hold every draft creation until the returned notify is signalled once per call.
    pub fn gate_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_requests.len()
    }

    pub fn create_requests(&self) -> Vec<CreatePersonalizationRequest> {
        self.state().create_requests.clone()
    }

    pub fn cart_calls(&self) -> usize {
        self.state().cart_requests.len()
    }

    pub fn cart_requests(&self) -> Vec<AddCartItemRequest> {
        self.state().cart_requests.clone()
    }

    /// Draft ids photos were uploaded to.
    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    pub fn book_requests(&self) -> usize {
        self.state().book_requests
    }

    pub fn cart_reads(&self) -> usize {
        self.state().cart_reads
    }

    pub fn list_requests(&self) -> Vec<CatalogFilters> {
        self.state().list_requests.clone()
    }
}

#[async_trait]
impl StorefrontApi for FakeApi {
    async fn list_books(&self, filters: &CatalogFilters) -> Result<BookPage, AppError> {
        self.state().list_requests.push(filters.clone());
        let search = filters.search.clone().unwrap_or_default().to_lowercase();
        let mut items: Vec<Book> = self
            .books
            .values()
            .filter(|b| b.title.to_lowercase().contains(&search))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(BookPage {
            total: items.len() as u64,
            items,
            page: filters.page,
            page_size: filters.page_size,
        })
    }

    async fn get_book(&self, slug: &str) -> Result<Book, AppError> {
        self.state().book_requests += 1;
        self.books
            .get(slug)
            .cloned()
            .ok_or_else(|| AppError::server(404, Some("Book not found".to_string())))
    }

    async fn create_personalization(
        &self,
        request: &CreatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        self.state().create_requests.push(request.clone());

        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state();
        if let Some(status) = state.create_failures.pop_front() {
            return Err(error_for(status));
        }
        state.next_id += 1;
        let draft = PersonalizationDraft {
            id: format!("p-{}", state.next_id),
            book_id: request.book_id.clone(),
            child_first_name: request.child_first_name.clone(),
            child_age: request.child_age,
            child_photo_url: request.child_photo_url.clone(),
            language_code: request.language_code.clone(),
            gender: request.gender,
            status: "draft".to_string(),
            generated_book_url: None,
            preview_data: None,
            created_at: None,
        };
        state.drafts.insert(draft.id.clone(), draft.clone());
        Ok(draft)
    }

    async fn get_personalization(&self, id: &str) -> Result<PersonalizationDraft, AppError> {
        self.state()
            .drafts
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::server(404, Some("Personalization not found".to_string())))
    }

    async fn update_personalization(
        &self,
        id: &str,
        request: &UpdatePersonalizationRequest,
    ) -> Result<PersonalizationDraft, AppError> {
        let mut state = self.state();
        let draft = state
            .drafts
            .get_mut(id)
            .ok_or_else(|| AppError::server(404, None))?;
        if let Some(name) = &request.child_first_name {
            draft.child_first_name = name.clone();
        }
        if let Some(url) = &request.child_photo_url {
            draft.child_photo_url = url.clone();
        }
        Ok(draft.clone())
    }

    async fn upload_photo(
        &self,
        id: &str,
        _photo: PhotoUpload,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadPhotoResponse, AppError> {
        if let Some(report) = &progress {
            report(50);
            report(100);
        }

        let mut state = self.state();
        state.uploads.push(id.to_string());
        if let Some(status) = state.upload_failures.pop_front() {
            return Err(error_for(status));
        }
        let photo_url = format!("https://cdn.example.com/{}.png", id);
        let draft = state
            .drafts
            .get_mut(id)
            .ok_or_else(|| AppError::server(404, None))?;
        draft.child_photo_url = photo_url.clone();
        Ok(UploadPhotoResponse {
            photo_url,
            personalization: draft.clone(),
        })
    }

    async fn get_cart(&self) -> Result<Cart, AppError> {
        let mut state = self.state();
        state.cart_reads += 1;
        Ok(state.cart.clone())
    }

    async fn add_cart_item(&self, request: &AddCartItemRequest) -> Result<CartItem, AppError> {
        let mut state = self.state();
        state.cart_requests.push(request.clone());
        if let Some(status) = state.cart_failures.pop_front() {
            return Err(error_for(status));
        }
        let item = CartItem {
            id: format!("ci-{}", state.cart.items.len() + 1),
            book_id: request.book_id.clone(),
            personalization_id: Some(request.personalization_id.clone()),
            quantity: request.quantity,
            language_code: Some(request.language_code.clone()),
            unit_price: None,
            book_title: None,
        };
        state.cart.items.push(item.clone());
        Ok(item)
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem, AppError> {
        let mut state = self.state();
        let item = state
            .cart
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| AppError::server(404, Some("Cart item not found".to_string())))?;
        item.quantity = quantity;
        Ok(item.clone())
    }

    async fn remove_cart_item(&self, item_id: &str) -> Result<(), AppError> {
        self.state().cart.items.retain(|i| i.id != item_id);
        Ok(())
    }
}

pub fn book(id: &str, slug: &str) -> Book {
    Book {
        id: id.to_string(),
        slug: slug.to_string(),
        title: slug.replace('-', " "),
        description: None,
        price: None,
        cover_image_url: None,
        ideal_for: None,
        age_min: Some(3),
        age_max: Some(8),
        languages: vec![
            BookLanguage {
                code: "en".to_string(),
                name: "English".to_string(),
                available: true,
            },
            BookLanguage {
                code: "fr".to_string(),
                name: "French".to_string(),
                available: true,
            },
        ],
    }
}

/// Memory store whose writes wait for a notify while gated.
pub struct GatedGuestStore {
    inner: Arc<MemoryGuestStore>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl GatedGuestStore {
    pub fn new(inner: Arc<MemoryGuestStore>) -> Self {
        Self {
            inner,
            gate: Mutex::new(None),
        }
    }

    pub fn gate_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl GuestStore for GatedGuestStore {
    async fn get(&self, slot: &str) -> StorageResult<Option<serde_json::Value>> {
        self.inner.get(slot).await
    }

    async fn put(&self, slot: &str, value: serde_json::Value) -> StorageResult<()> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.inner.put(slot, value).await
    }

    async fn remove(&self, slot: &str) -> StorageResult<()> {
        self.inner.remove(slot).await
    }

    fn backend_name(&self) -> &'static str {
        "gated-memory"
    }
}

pub fn png(len: usize) -> PhotoUpload {
    PhotoUpload::new("mia.png", "image/png", Bytes::from(vec![0x89u8; len]))
}

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub store: Arc<MemoryGuestStore>,
    pub queries: QueryClient,
    pub wizard: Arc<Wizard>,
}

pub fn harness(authenticated: bool) -> Harness {
    harness_with_upload_hold(authenticated, Duration::ZERO)
}

pub fn harness_with_upload_hold(authenticated: bool, hold: Duration) -> Harness {
    let store = Arc::new(MemoryGuestStore::new());
    build_harness(authenticated, hold, store.clone(), store)
}

/// Guest harness whose store writes can be held open.
pub fn gated_guest_harness() -> (Harness, Arc<GatedGuestStore>) {
    let store = Arc::new(MemoryGuestStore::new());
    let gated = Arc::new(GatedGuestStore::new(store.clone()));
    let h = build_harness(false, Duration::ZERO, store, gated.clone());
    (h, gated)
}

fn build_harness(
    authenticated: bool,
    hold: Duration,
    store: Arc<MemoryGuestStore>,
    backend: Arc<dyn GuestStore>,
) -> Harness {
    let api = Arc::new(FakeApi::new());
    let queries = QueryClient::new(Duration::from_secs(300), 64);
    let auth = StaticAuth(if authenticated {
        AuthContext::authenticated()
    } else {
        AuthContext::guest()
    });
    let wizard = Wizard::new(api.clone(), queries.clone(), backend, Arc::new(auth))
        .with_upload_hold(hold);

    Harness {
        api,
        store,
        queries,
        wizard: Arc::new(wizard),
    }
}

/// Fill the form with the child from the reference scenario.
pub fn fill_mia(wizard: &Wizard) {
    wizard
        .edit_form(|form| {
            form.child_first_name = "Mia".to_string();
            form.child_age = Some(6);
            form.language_code = Some("en".to_string());
            form.gender = Some(Gender::Female);
        })
        .unwrap();
}

/// Load the book, fill the form and attach an inline photo.
pub async fn ready_to_submit(h: &Harness, slug: &str) {
    h.wizard.enter_book(slug).await.unwrap();
    fill_mia(&h.wizard);
    h.wizard.select_photo(png(1024)).await.unwrap();
}

/// Yield until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
