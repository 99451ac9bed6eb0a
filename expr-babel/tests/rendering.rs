//! Rendered XML for a representative tree: scopes, labels and control flow.

use expr_babel::expr::GotoKind;
use expr_babel::types::{NamingConvention, TypeRef};
use expr_babel::{Expr, LabelTarget, NodeKind, ParameterExpr, TransformOptions, Transformer};
use insta::assert_snapshot;

/// `n => { total = 0; loop { if (n > 0) { total += n; n--; } else break total; } }`
fn countdown() -> Expr {
    let n = ParameterExpr::new("n", TypeRef::INT32);
    let total = ParameterExpr::new("total", TypeRef::INT32);
    let done = LabelTarget::new("done", TypeRef::INT32);
    let step = Expr::block(
        vec![],
        vec![
            Expr::binary(
                NodeKind::AddAssign,
                Expr::parameter(&total),
                Expr::parameter(&n),
            ),
            Expr::unary(
                NodeKind::PostDecrementAssign,
                Expr::parameter(&n),
                TypeRef::INT32,
            ),
        ],
    );
    let body = Expr::condition(
        Expr::binary(NodeKind::GreaterThan, Expr::parameter(&n), Expr::literal(0)),
        step,
        Expr::goto(GotoKind::Break, &done, Some(Expr::parameter(&total))),
    );
    Expr::lambda(
        vec![n],
        Expr::block(
            vec![total.clone()],
            vec![
                Expr::assign(Expr::parameter(&total), Expr::literal(0)),
                Expr::loop_with(body, Some(&done), None),
            ],
        ),
    )
}

#[test]
fn countdown_xml() {
    let bytes = Transformer::default().to_bytes(&countdown(), "xml").unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert_snapshot!(xml.trim_end(), @r#"
    <?xml version="1.0" encoding="utf-8"?>
    <expression>
      <lambda type="Func&lt;int32, int32&gt;">
        <parameters>
          <parameter-definition id="P1" name="n" type="int32"/>
        </parameters>
        <body>
          <block type="int32">
            <variables>
              <parameter-definition id="P2" name="total" type="int32"/>
            </variables>
            <expressions>
              <assign type="int32">
                <parameter-reference idref="P2"/>
                <int>0</int>
              </assign>
              <loop type="int32">
                <break-label>
                  <label-definition id="L1" name="done" type="int32"/>
                </break-label>
                <body>
                  <conditional type="int32">
                    <greater-than type="bool">
                      <parameter-reference idref="P1"/>
                      <int>0</int>
                    </greater-than>
                    <block type="int32">
                      <variables/>
                      <expressions>
                        <add-assign type="int32">
                          <parameter-reference idref="P2"/>
                          <parameter-reference idref="P1"/>
                        </add-assign>
                        <post-decrement-assign type="int32">
                          <parameter-reference idref="P1"/>
                        </post-decrement-assign>
                      </expressions>
                    </block>
                    <goto type="void" goto-kind="break">
                      <label-reference idref="L1"/>
                      <parameter-reference idref="P2"/>
                    </goto>
                  </conditional>
                </body>
              </loop>
            </expressions>
          </block>
        </body>
      </lambda>
    </expression>
    "#);
}

#[test]
fn nullable_list_full_names() {
    let items = vec![
        expr_babel::Value::I32(7),
        expr_babel::Value::Null,
    ];
    let expr = Expr::constant(
        expr_babel::Value::list(items),
        TypeRef::list(TypeRef::nullable(TypeRef::INT32)),
    );
    let options = TransformOptions::default().with_convention(NamingConvention::Full);
    let bytes = Transformer::new(options).to_bytes(&expr, "xml").unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert_snapshot!(xml.trim_end(), @r#"
    <?xml version="1.0" encoding="utf-8"?>
    <expression>
      <collection type="collections.List&lt;core.Nullable&lt;core.int32&gt;&gt;" element-type="core.Nullable&lt;core.int32&gt;" length="2">
        <nullable type="core.int32">
          <!-- int32 -->
          <int>7</int>
        </nullable>
        <nullable type="core.int32" nil="true"/>
      </collection>
    </expression>
    "#);
}
