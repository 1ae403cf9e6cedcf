mod config_loading;
mod dispatcher;
mod lease_manager;
mod lease_store;
