//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod invoice;
pub mod invoice_line;
pub mod membership_line;
pub mod membership_line_contact;
pub mod membership_type;
pub mod partner;
pub mod product;
pub mod subscription;
pub mod subscription_contact;
pub mod subscription_stage;

// Re-export specific types to avoid conflicts
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use invoice_line::{
    Column as InvoiceLineColumn, Entity as InvoiceLine, Model as InvoiceLineModel,
};
pub use membership_line::{
    Column as MembershipLineColumn, Entity as MembershipLine, Model as MembershipLineModel,
};
pub use membership_line_contact::{
    Column as MembershipLineContactColumn, Entity as MembershipLineContact,
    Model as MembershipLineContactModel,
};
pub use membership_type::{
    Column as MembershipTypeColumn, Entity as MembershipType, Model as MembershipTypeModel,
};
pub use partner::{Column as PartnerColumn, Entity as Partner, Model as PartnerModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use subscription_contact::{
    Column as SubscriptionContactColumn, Entity as SubscriptionContact,
    Model as SubscriptionContactModel,
};
pub use subscription_stage::{
    Column as SubscriptionStageColumn, Entity as SubscriptionStage,
    Model as SubscriptionStageModel,
};
