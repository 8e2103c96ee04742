//! Hydration bootstrap generation.

use armature_runtime::{fallback_html, COMPONENT_ATTR};

use crate::entry::REGISTRY_GLOBAL;
use crate::js::{ident, AssignOp, BinOp, Expr, Module, Stmt};

/// Generate the script appended to a route's entry bundle.
///
/// When it runs it:
/// - installs a `window` `error` listener that replaces the mount container
///   with the fallback message;
/// - reads route parameters from the container's `data-params`;
/// - renders the registered component, wrapped in its layout if it has one;
/// - replaces the element tagged `data-c-arm-id="<id>"`, or appends the
///   rendered root if there is none.
///
/// Everything is wrapped in an arrow so no names leak into the bundle's scope.
pub fn hydration_script(component_id: &str, mount_selector: &str) -> Module {
    let container = || Expr::from(ident("container"));
    let entry = || Expr::from(ident("entry"));
    let document = || Expr::from(ident("document"));

    let mut body = vec![
        Stmt::Const(
            ident("container"),
            document().method(ident("querySelector"), vec![Expr::str(mount_selector)]),
        ),
        Stmt::Expr(Expr::from(ident("window")).method(
            ident("addEventListener"),
            vec![
                Expr::str("error"),
                Expr::Arrow(
                    vec![],
                    vec![Stmt::when(
                        container(),
                        vec![Stmt::Expr(container().member(ident("innerHTML")).assign(
                            AssignOp::Assign,
                            Expr::str(fallback_html()),
                        ))],
                    )],
                ),
            ],
        )),
        Stmt::Const(
            ident("entry"),
            Expr::from(ident("globalThis"))
                .member(ident(REGISTRY_GLOBAL))
                .binary(BinOp::Nullish, Expr::Object(Vec::new()))
                .index(Expr::str(component_id)),
        ),
        Stmt::when(
            entry().not().binary(BinOp::Or, container().not()),
            vec![Stmt::Return(None)],
        ),
        Stmt::Const(
            ident("params"),
            Expr::from(ident("JSON")).method(
                ident("parse"),
                vec![container()
                    .member(ident("dataset"))
                    .member(ident("params"))
                    .binary(BinOp::Nullish, Expr::str("{}"))],
            ),
        ),
    ];

    let render_page = entry().method(ident("render"), vec![ident("p").into()]);
    body.push(Stmt::Const(
        ident("render"),
        Expr::Arrow(
            vec![ident("p")],
            vec![
                Stmt::when(
                    entry().member(ident("layout")),
                    vec![Stmt::Return(Some(entry().method(
                        ident("layout"),
                        vec![Expr::Object(vec![(ident("children"), render_page.clone())])],
                    )))],
                ),
                Stmt::Return(Some(render_page)),
            ],
        ),
    ));

    let view = || Expr::from(ident("view"));
    let root = || Expr::from(ident("root"));
    let selector = format!("[{}=\"{}\"]", COMPONENT_ATTR, component_id);
    let apply = Expr::Arrow(
        vec![ident("view")],
        vec![
            Stmt::Const(
                ident("holder"),
                document().method(ident("createElement"), vec![Expr::str("div")]),
            ),
            Stmt::Expr(
                Expr::from(ident("holder")).member(ident("innerHTML")).assign(
                    AssignOp::Assign,
                    view()
                        .binary(BinOp::And, view().member(ident("string")))
                        .binary(BinOp::Nullish, view()),
                ),
            ),
            Stmt::Const(
                ident("root"),
                Expr::from(ident("holder")).member(ident("firstElementChild")),
            ),
            Stmt::when(root().not(), vec![Stmt::Return(None)]),
            Stmt::Expr(root().method(
                ident("setAttribute"),
                vec![Expr::str(COMPONENT_ATTR), Expr::str(component_id)],
            )),
            Stmt::Const(
                ident("existing"),
                container().method(ident("querySelector"), vec![Expr::str(selector)]),
            ),
            Stmt::If {
                test: ident("existing").into(),
                then: vec![Stmt::Expr(container().method(
                    ident("replaceChild"),
                    vec![root(), ident("existing").into()],
                ))],
                otherwise: vec![Stmt::Expr(
                    container().method(ident("appendChild"), vec![root()]),
                )],
            },
        ],
    );

    body.push(Stmt::Expr(
        Expr::from(ident("Promise"))
            .method(
                ident("resolve"),
                vec![Expr::from(ident("render")).call(vec![ident("params").into()])],
            )
            .method(ident("then"), vec![apply]),
    ));

    let mut module = Module::new();
    module.push(Stmt::Expr(Expr::Arrow(vec![], body).call(Vec::new())));
    module
}
