pub mod zendesk;

pub use zendesk::ZendeskDirectory;
