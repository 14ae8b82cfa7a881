pub mod in_memory_store;
pub mod supabase_store;

pub use in_memory_store::InMemoryStore;
pub use supabase_store::SupabaseStore;
