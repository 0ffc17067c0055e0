pub mod google_translator;
pub mod microsoft_translator;
