mod assertions;
mod backends;
mod settings;
mod transactions;
