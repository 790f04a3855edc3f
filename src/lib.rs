//! Associated entities of an organisation and its shareholder structure.
//!
//! Individuals and corporates hold roles (shareholder, director, authorised
//! signatory, user, ...) and direct or indirect shareholdings. The ownership
//! tree is derived from those flat affiliations on demand.
//!
//! Layers, innermost first: [`domain`] (pure model and rules),
//! [`application`] (session store, services, add/link flow),
//! [`infrastructure`] (seed files, I/O ports, wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
