pub mod json_voice_catalog;
