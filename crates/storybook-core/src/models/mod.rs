pub mod book;
pub mod cart;
pub mod catalog;
pub mod personalization;

pub use book::{Book, BookLanguage, BookPage};
pub use cart::{AddCartItemRequest, Cart, CartItem, UpdateCartItemRequest};
pub use catalog::{AgeRange, CatalogFilters, IdealFor, DEFAULT_PAGE_SIZE};
pub use personalization::{
    ChildInfo, CreatePersonalizationRequest, Gender, PendingPersonalization,
    PersonalizationDraft, UpdatePersonalizationRequest, UploadPhotoResponse,
    TEMP_PERSONALIZATION_ID,
};
