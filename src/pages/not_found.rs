use leptos::prelude::*;

/// 404 page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<main class="chart-page">
			<h1>"Nobody here"</h1>
			<p class="subtitle">"That page is not on the chart."</p>
			<a href="/">"Back to the chart"</a>
		</main>
	}
}
