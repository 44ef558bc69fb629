use leptos::prelude::*;

use crate::components::force_graph::{InteractionEngine, type_label};

struct Details {
	name: String,
	group: String,
	relationships: Vec<String>,
	// (link id, neighbor name, link type)
	connections: Vec<(String, String, String)>,
}

fn details(engine: &InteractionEngine) -> Option<Details> {
	let id = engine.view().selected.as_deref()?;
	let graph = engine.graph();
	let node = graph.node(id)?;
	let connections = engine
		.connections(id)
		.into_iter()
		.map(|n| {
			let name = graph
				.node(&n.node_id)
				.map(|other| other.display_name.clone())
				.unwrap_or_else(|| n.node_id.clone());
			(n.link_id.clone(), name, type_label(&n.kind))
		})
		.collect();
	Some(Details {
		name: node.display_name.clone(),
		group: type_label(&node.group),
		relationships: graph
			.relationships_of(id)
			.iter()
			.map(|kind| type_label(kind))
			.collect(),
		connections,
	})
}

#[component]
pub fn DetailPanel(engine: RwSignal<InteractionEngine>) -> impl IntoView {
	view! {
		<aside class="chart-details">
			{move || match engine.with(details) {
				Some(d) => {
					let relationships = if d.relationships.is_empty() {
						view! { <p class="muted">"No relationships recorded."</p> }.into_any()
					} else {
						view! {
							<div class="chips">
								{d
									.relationships
									.into_iter()
									.map(|kind| view! { <span class="chip">{kind}</span> })
									.collect_view()}
							</div>
						}
							.into_any()
					};
					let connections = if d.connections.is_empty() {
						view! { <p class="muted">"No visible connections."</p> }.into_any()
					} else {
						view! {
							<ul class="connections">
								{d
									.connections
									.into_iter()
									.map(|(link_id, name, kind)| {
										view! {
											<li data-link=link_id>
												<span>{name}</span>
												<span class="connection-type">{kind}</span>
											</li>
										}
									})
									.collect_view()}
							</ul>
						}
							.into_any()
					};
					view! {
						<div>
							<h2>{d.name}</h2>
							<p class="muted">"Group: " {d.group}</p>
							<h3>"Relationship types"</h3>
							{relationships}
							<h3>"Connections"</h3>
							{connections}
						</div>
					}
						.into_any()
				}
				None => {
					view! {
						<div class="muted">
							<p>
								"Select a person in the chart to view their relationships and connections."
							</p>
							<p>
								"Tip: use the filter to focus on a relationship type or the search bar to jump directly to someone."
							</p>
						</div>
					}
						.into_any()
				}
			}}
		</aside>
	}
}
