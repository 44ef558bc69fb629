//! Browser entry point for the chart app.

// The library pulls in the rest of the dependency stack.
#![allow(unused_crate_dependencies)]

use leptos::mount::mount_to_body;
use the_chart::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
