//! This module contains the background tasks for the cache, namely the
//! janitor that sweeps expired slots and reports them to the listener.

pub(crate) mod janitor;
