use leptos::prelude::*;
use serde_json::{Value, json};

use crate::components::chart::ChartView;
use crate::components::force_graph::build;

/// Records as the data layer hands them over: mixed id types, stray
/// whitespace, the odd incomplete row and a link to someone who was deleted.
fn public_records() -> (Vec<Value>, Vec<Value>) {
	let nodes = vec![
		json!({"id": "alex", "displayName": "Alex", "group": "friend"}),
		json!({"id": "sam", "displayName": "Sam", "group": "dating"}),
		json!({"id": "jordan", "displayName": "Jordan", "group": "ex"}),
		json!({"id": "casey", "displayName": " Casey ", "group": "friend"}),
		json!({"id": "riley", "displayName": "Riley", "group": "colleague"}),
		json!({"id": "morgan", "displayName": "Morgan", "group": "family"}),
		json!({"id": "taylor", "displayName": "Taylor", "group": "friend"}),
		json!({"id": "quinn", "name": "Quinn", "group_type": "colleague"}),
		json!({"id": 42, "displayName": "Avery", "group": "family"}),
		json!({"id": "drew", "displayName": "Drew"}),
		json!({"id": "alex", "displayName": "Alex (again)", "group": "ex"}),
	];
	let links = vec![
		json!({"sourceId": "alex", "targetId": "sam", "type": "dating"}),
		json!({"sourceId": "alex", "targetId": "jordan", "type": "ex"}),
		json!({"sourceId": "sam", "targetId": "casey", "type": "friend"}),
		json!({"sourceId": "casey", "targetId": "alex", "type": "friend"}),
		json!({"sourceId": "riley", "targetId": "quinn", "type": "colleague"}),
		json!({"sourceId": "riley", "targetId": "alex", "type": "colleague"}),
		json!({"sourceId": "morgan", "targetId": 42, "type": "family"}),
		json!({"sourceId": "morgan", "targetId": "taylor", "type": "friend"}),
		json!({"sourceId": "taylor", "targetId": "jordan", "type": "dating"}),
		json!({"sourceId": "jordan", "targetId": "sam", "type": "ex"}),
		json!({"sourceId": "quinn", "targetId": "taylor", "relationship_type": "friend"}),
		json!({"source": 42, "target": "casey", "type": "family"}),
		json!({"sourceId": "alex", "targetId": "sam", "type": "dating"}),
		json!({"sourceId": "sam", "targetId": "deleted-user", "type": "friend"}),
		json!({"sourceId": "taylor", "type": "friend"}),
	];
	(nodes, links)
}

/// Public chart of everyone's relationships.
#[component]
pub fn Home() -> impl IntoView {
	let (nodes, links) = public_records();
	let graph = RwSignal::new(build(&nodes, &links));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<main class="chart-page">
				<header>
					<h1>"The Chart 2.0"</h1>
					<p class="subtitle">
						"Hover to trace connections. Click someone to pin them. Search to jump straight to a person."
					</p>
				</header>
				<ChartView graph=graph />
			</main>
		</ErrorBoundary>
	}
}
