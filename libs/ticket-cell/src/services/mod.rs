pub mod allocator;
pub mod dispatcher;
pub mod estimator;
pub mod gateway;
pub mod store;
pub mod ticket;

pub use allocator::{DoctorDirectory, TicketAllocator};
pub use dispatcher::NotificationDispatcher;
pub use gateway::{DeliveryError, DisabledGateway, MessagingGateway, WhatsAppGateway};
pub use store::{HttpSequenceStore, HttpTicketStore, MemoryStore, SequenceStore, TicketStore};
pub use ticket::TicketService;
