use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use log::debug;

use super::details::DetailPanel;
use crate::components::force_graph::{
	ALL, ForceGraphCanvas, Graph, InteractionEngine, MESSAGE_TTL, RelationshipFilter,
	SearchOutcome, type_label,
};

fn now_ms() -> f64 {
	js_sys::Date::now()
}

/// Searchable, filterable chart of one graph with a detail panel for the
/// selected person.
#[component]
pub fn ChartView(#[prop(into)] graph: Signal<Graph>) -> impl IntoView {
	let engine = RwSignal::new(InteractionEngine::new(graph.get_untracked()));

	Effect::new(move |_| {
		let graph = graph.get();
		engine.update(|e| e.load(graph));
	});

	let visibility = Memo::new(move |_| engine.with(|e| e.visibility().clone()));
	let highlight = Memo::new(move |_| engine.with(InteractionEngine::highlight));
	let focus = Memo::new(move |_| engine.with(|e| e.view().focus.clone()));
	let filter = Memo::new(move |_| engine.with(|e| e.view().filter.as_str().to_string()));
	let message = Memo::new(move |_| engine.with(|e| e.message().map(str::to_string)));

	let on_node_hover =
		Callback::new(move |id: Option<String>| engine.update(|e| e.hover(id.as_deref())));
	let on_node_click = Callback::new(move |id: String| engine.update(|e| e.click(&id, now_ms())));
	let on_background_click =
		Callback::new(move |_: ()| engine.update(InteractionEngine::background_click));

	let on_search = move |ev: SubmitEvent| {
		ev.prevent_default();
		let outcome = engine.try_update(|e| {
			let term = e.view().search_term.clone();
			e.search(&term, now_ms())
		});
		match outcome {
			Some(SearchOutcome::Found(id)) => debug!("Search jumped to {:?}", id),
			Some(miss) => {
				if let SearchOutcome::NotFound(term) = miss {
					debug!("Search for {:?} found nobody", term);
				}
				set_timeout(
					move || {
						let _ = engine.try_update(|e| e.expire_message(now_ms()));
					},
					MESSAGE_TTL,
				);
			}
			None => {}
		}
	};

	let filter_options = move || {
		let current = filter.get();
		graph.with(|g| {
			std::iter::once(ALL.to_string())
				.chain(g.relationship_types())
				.map(|kind| {
					let label = if kind == ALL {
						"All relationships".to_string()
					} else {
						type_label(&kind)
					};
					let selected = kind == current;
					view! { <option value=kind selected=selected>{label}</option> }
				})
				.collect_view()
		})
	};

	view! {
		<div class="chart-layout">
			<div class="chart-panel">
				<div class="chart-toolbar">
					<form class="chart-search" on:submit=on_search>
						<label for="search" class="sr-only">"Search people"</label>
						<input
							id="search"
							placeholder="Search by name"
							prop:value=move || engine.with(|e| e.view().search_term.clone())
							on:input=move |ev| {
								let term = event_target_value(&ev);
								engine.update(|e| e.set_search_term(term));
							}
						/>
						<button type="submit">"Search"</button>
					</form>
					<div class="chart-filter">
						<label for="relationship-filter">"Filter"</label>
						<select
							id="relationship-filter"
							prop:value=move || filter.get()
							on:change=move |ev| {
								let value = event_target_value(&ev);
								engine.update(|e| e.set_filter(RelationshipFilter::parse(&value)));
							}
						>
							{filter_options}
						</select>
					</div>
				</div>
				{move || message.get().map(|text| view! { <div class="chart-message">{text}</div> })}
				<ForceGraphCanvas
					graph=graph
					visibility=visibility
					highlight=highlight
					focus=focus
					on_node_hover=on_node_hover
					on_node_click=on_node_click
					on_background_click=on_background_click
				/>
			</div>
			<DetailPanel engine=engine />
		</div>
	}
}
