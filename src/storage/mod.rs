pub mod certificate_store;
