//! Rendering components: effects, events, hydration, scoping and wrappers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lattice_testing::{
    create_effect, dynamic, el, fire_event, render, screen, setup, text, Node, NodeRef,
    RenderOptions, Signal, View, WrapperProps,
};
use pretty_assertions::assert_eq;

#[test]
fn render_runs_effects_immediately() {
    let _cleanup = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    render(
        move || {
            create_effect(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            View::Empty
        },
        RenderOptions::default(),
    )
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn find_by_test_id_returns_the_ref() {
    let _cleanup = setup();
    let div_ref = NodeRef::new();
    let target = div_ref.clone();

    render(
        move || el("div").node_ref(&target).attr("data-testid", "foo"),
        RenderOptions::default(),
    )
    .unwrap();

    let found = screen().find_by_test_id("foo").await.unwrap();
    assert_eq!(Some(found), div_ref.get());
}

fn counter(calls: Arc<AtomicUsize>) -> View {
    let count = Signal::new(0);
    let (seen, label, setter) = (count.clone(), count.clone(), count);
    create_effect(move || {
        seen.get();
        calls.fetch_add(1, Ordering::SeqCst);
    });
    el("button")
        .on("click", move |_| setter.update(|n| n + 1))
        .child(dynamic(move || label.get().to_string().into()))
        .into()
}

#[test]
fn click_triggers_effects() {
    let _cleanup = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let props = calls.clone();

    let view = render(move || counter(props), RenderOptions::default()).unwrap();
    let button = view.container().first_child().unwrap();

    calls.store(0, Ordering::SeqCst);
    fire_event::click(&button);

    assert_eq!(button.text_content(), "1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn hydrate_runs_effects() {
    let _cleanup = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    render(
        move || {
            create_effect(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            View::Empty
        },
        RenderOptions::new().hydrate(true),
    )
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn hydrate_reuses_existing_markup() {
    let _cleanup = setup();
    let calls = Arc::new(AtomicUsize::new(0));

    let host = Node::element("div");
    let button = Node::element("button");
    button.append_child(&Node::text("0")).unwrap();
    host.append_child(&button).unwrap();
    screen().container().append_child(&host).unwrap();

    let props = calls.clone();
    let view = render(
        move || counter(props),
        RenderOptions::new().container(host.clone()).hydrate(true),
    )
    .unwrap();

    assert_eq!(view.as_fragment(), "<button>0</button>");
    assert_eq!(view.get_by_role("button").unwrap(), button);

    fire_event::click(&button);
    assert_eq!(view.as_fragment(), "<button>1</button>");
    assert_eq!(host.child_count(), 1);
}

#[test]
fn queries_stay_inside_the_container() {
    let _cleanup = setup();
    let view = render(|| el("div").text("Some text..."), RenderOptions::default()).unwrap();

    let decoy = Node::element("p");
    decoy.set_text_content("Some text...");
    let body = view.container().parent().unwrap();
    body.insert_before(&decoy, Some(view.container())).unwrap();

    let found = view.get_all_by_text("Some text...").unwrap();
    assert_eq!(found, vec![view.container().first_child().unwrap()]);
    assert_eq!(screen().get_all_by_text("Some text...").unwrap().len(), 2);
}

#[test]
fn wrapper_nests_the_component() {
    let _cleanup = setup();
    let view = render(
        || el("div").text("Component"),
        RenderOptions::new().wrapper(|WrapperProps { children }| {
            el("div").child(text("Wrapper ")).child(children).into()
        }),
    )
    .unwrap();

    assert_eq!(view.as_fragment(), "<div>Wrapper <div>Component</div></div>");
}

#[test]
fn as_fragment_tracks_current_markup() {
    let _cleanup = setup();
    let name = Signal::new("Ada".to_string());
    let label = name.clone();

    let view = render(
        move || el("p").child(dynamic(move || label.get().into())),
        RenderOptions::default(),
    )
    .unwrap();
    assert_eq!(view.as_fragment(), "<p>Ada</p>");

    name.set("Grace".to_string());
    assert_eq!(view.as_fragment(), "<p>Grace</p>");
}

#[test]
fn unmount_stops_updates_but_keeps_markup() {
    let _cleanup = setup();
    let count = Signal::new(0);
    let label = count.clone();

    let view = render(
        move || el("span").child(dynamic(move || label.get().to_string().into())),
        RenderOptions::default(),
    )
    .unwrap();

    view.unmount();
    count.set(5);
    assert_eq!(view.as_fragment(), "<span>0</span>");
    assert!(view.container().is_connected());
}
