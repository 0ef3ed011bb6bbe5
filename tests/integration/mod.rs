//! Integration tests driving the kapctl binary against real git checkouts

mod helpers;
mod test_cli;
mod test_link;
mod test_push;
