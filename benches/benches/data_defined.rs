// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `quire_data_defined`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use quire_data_defined::{
    Composition, CompositionEvents, DataDefinedObject, DataDefinedProperty, Element,
    EvaluationError, ExpressionContext, ExpressionContextScope, Feature, OverrideStore,
    Value, resolve_override,
};

/// Returns the value of `@name` variables, or parses a number.
fn lookup(expression: &str, context: &ExpressionContext) -> Result<Value, String> {
    match expression.strip_prefix('@') {
        Some(name) => context.variable(name).cloned().ok_or_else(|| name.to_owned()),
        None => expression
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| e.to_string()),
    }
}

struct Atlas {
    events: CompositionEvents,
    feature: Feature,
}

impl Composition for Atlas {
    fn events(&self) -> &CompositionEvents {
        &self.events
    }

    fn create_expression_context(&self) -> ExpressionContext {
        ExpressionContext::new()
            .with_scope(ExpressionContextScope::new("Global").with_variable("unit", "mm"))
            .with_scope(
                ExpressionContextScope::new("Atlas")
                    .with_variable("layer_name", "cities")
                    .with_feature(self.feature.clone()),
            )
    }

    fn data_defined_evaluate(
        &self,
        property: DataDefinedProperty,
        context: &ExpressionContext,
        overrides: &OverrideStore,
    ) -> Result<Option<Value>, EvaluationError> {
        resolve_override(property, overrides.get(property), context, &lookup)
    }
}

fn populated(object: &mut DataDefinedObject<'_>, count: usize) {
    for (i, property) in DataDefinedProperty::ALL.into_iter().take(count).enumerate() {
        if i % 2 == 0 {
            object
                .set_override(property, true, true, "@layer_name", "")
                .unwrap();
        } else {
            object
                .set_override(property, true, false, "", "heading")
                .unwrap();
        }
    }
}

fn bench_data_defined(c: &mut Criterion) {
    let atlas = Atlas {
        events: CompositionEvents::new(),
        feature: Feature::new(1)
            .with_attribute("name", "Bergen")
            .with_attribute("heading", 42.0),
    };

    let mut group = c.benchmark_group("data_defined/evaluate");

    let mut object = DataDefinedObject::new(Some(&atlas));
    populated(&mut object, DataDefinedProperty::ALL.len());
    object.prepare_expressions();
    let context = object.create_expression_context();

    group.bench_function("expression", |b| {
        b.iter(|| black_box(object.evaluate(DataDefinedProperty::Test, &context)))
    });
    group.bench_function("field", |b| {
        b.iter(|| black_box(object.evaluate(DataDefinedProperty::PresetPaperSize, &context)))
    });
    group.bench_function("missing", |b| {
        let empty = DataDefinedObject::new(Some(&atlas));
        b.iter(|| black_box(empty.evaluate(DataDefinedProperty::ItemRotation, &context)))
    });
    group.bench_function("all_per_feature", |b| {
        b.iter(|| {
            let context = object.create_expression_context();
            for property in DataDefinedProperty::ALL {
                let _ = black_box(object.evaluate(property, &context));
            }
        })
    });

    group.finish();

    let mut group = c.benchmark_group("data_defined/prepare");
    for count in [1_usize, 4, DataDefinedProperty::ALL.len()] {
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter_batched(
                || {
                    let mut object = DataDefinedObject::new(Some(&atlas));
                    populated(&mut object, count);
                    object
                },
                |mut object| {
                    black_box(object.prepare_expressions());
                    black_box(object);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();

    let mut group = c.benchmark_group("data_defined/state");

    let mut object = DataDefinedObject::standalone();
    populated(&mut object, DataDefinedProperty::ALL.len());
    object.set_custom_property("title", "Atlas of cities");
    object.set_custom_property("tags", vec!["north".to_owned(), "coast".to_owned()]);

    group.bench_function("write", |b| {
        b.iter(|| {
            let mut element = Element::new("ComposerItem");
            object.write_state(&mut element).unwrap();
            black_box(element)
        })
    });

    let mut element = Element::new("ComposerItem");
    object.write_state(&mut element).unwrap();
    group.bench_function("read", |b| {
        b.iter_batched(
            DataDefinedObject::standalone,
            |mut fresh| {
                fresh.read_state(&element).unwrap();
                black_box(fresh);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("write_json", |b| {
        b.iter(|| black_box(serde_json::to_string(&element).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_data_defined);
criterion_main!(benches);
