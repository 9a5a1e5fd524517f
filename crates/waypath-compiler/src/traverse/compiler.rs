//! Recursive translation of expression nodes into traversal fragments.
//!
//! Each `compile_*` helper handles one node kind: it checks the node's
//! static preconditions against the shape graph, emits a fragment, and
//! returns the resulting value description. Consumers unwrap optional
//! inputs before descending (a shadowing `let _x = _x?;` rebind), so a
//! fragment's bindings are always concretely typed at the point of use.
//!
//! Identifier numbering comes from a single counter: container nodes
//! (projections, filters) allocate their identifier before descending into
//! the per-element body, value nodes after their operands.

use waypath_core::{ShapeKind, ShapeQuery};

use crate::ast::{Expr, Literal};

use super::bindings::TraversalBindings;
use super::error::{TraversalError, TraversalResult, invalid, unsupported};
use super::value::{GeneratedTraversal, Ownership, TraversalType, TraversedShape, TupleEntry};

/// Compile `expr` against `bindings` and the shape graph.
///
/// The single entry point of the compiler. On success the returned
/// [`GeneratedTraversal`] is ready for embedding in a function that takes
/// the bound roots by reference and returns an optional value of the
/// declared output type.
pub fn compile_traversal<Q: ShapeQuery + ?Sized>(
    shapes: &Q,
    expr: &Expr,
    bindings: &TraversalBindings,
) -> TraversalResult<GeneratedTraversal> {
    let mut compiler = TraversalCompiler { shapes, names: 0 };
    let root = bindings.global_root();
    let scope = Scope {
        current: root.as_ref(),
        roots: Some(bindings),
    };
    compiler.compile(expr, &scope)
}

/// What a node compiles against: the current value, plus the root bindings
/// when the node sits at the root of the expression. Recursion into
/// sub-expression and projection bodies drops the roots, so named bindings
/// never shadow member names deeper in.
struct Scope<'s> {
    current: Option<&'s GeneratedTraversal>,
    roots: Option<&'s TraversalBindings>,
}

impl<'s> Scope<'s> {
    fn over(value: &'s GeneratedTraversal) -> Self {
        Scope {
            current: Some(value),
            roots: None,
        }
    }
}

/// Scalar comparability families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Numeric { float: bool },
    Text,
    Truth,
    Other,
}

/// A value in operand position: its identifier, type, and whether the
/// binding holds a reference that must be dereferenced to read the scalar.
struct Operand<'t> {
    ident: &'t str,
    ty: &'t TraversalType,
    by_ref: bool,
}

fn operand(value: &GeneratedTraversal) -> Operand<'_> {
    Operand {
        ident: &value.ident,
        ty: &value.output.ty,
        by_ref: value.ownership == Ownership::Reference,
    }
}

struct TraversalCompiler<'a, Q: ShapeQuery + ?Sized> {
    shapes: &'a Q,
    names: u32,
}

impl<Q: ShapeQuery + ?Sized> TraversalCompiler<'_, Q> {
    fn compile(&mut self, expr: &Expr, scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        match expr {
            Expr::Current => self.compile_current(scope),
            Expr::Field(name) => self.compile_field(name, scope),
            Expr::Subexpression(left, right) => self.compile_subexpression(left, right, scope),
            Expr::Flatten(inner) => self.compile_flatten(inner, scope),
            Expr::Projection(left, right) => self.compile_projection(left, right, scope),
            Expr::ObjectProjection(left, right) => {
                self.compile_object_projection(left, right, scope)
            }
            Expr::FilterProjection {
                left,
                comparison,
                right,
            } => self.compile_filter(left, comparison, right, scope),
            Expr::MultiSelectList(items) => self.compile_multi_select_list(items, scope),
            Expr::MultiSelectHash(_) => {
                Err(unsupported("Multi-select hash expressions are not supported"))
            }
            Expr::Index(_) => Err(unsupported("Index expressions are not supported")),
            Expr::Slice { .. } => Err(unsupported("Slice expressions are not supported")),
            Expr::And(left, right) => self.compile_boolean_op("&&", "and", left, right, scope),
            Expr::Or(left, right) => self.compile_boolean_op("||", "or", left, right, scope),
            Expr::Not(inner) => self.compile_not(inner, scope),
            Expr::Comparison { op, left, right } => {
                self.compile_comparison(op.as_str(), left, right, scope)
            }
            Expr::Function { name, args } => self.compile_function(name, args, scope),
            Expr::Literal(literal) => self.compile_literal(literal),
        }
    }

    fn compile_current(&self, scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        scope
            .current
            .map(GeneratedTraversal::rebind)
            .ok_or_else(|| TraversalError::UnboundRoot("@".to_string()))
    }

    fn compile_field(&mut self, name: &str, scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        if let Some(roots) = scope.roots
            && let Some(root) = roots.resolve_named(name)
        {
            return Ok(root);
        }
        let current = scope
            .current
            .ok_or_else(|| TraversalError::UnboundRoot(name.to_string()))?;
        let TraversalType::Shape(shape) = &current.output.ty else {
            return Err(invalid("Cannot look up fields in non-struct shapes"));
        };
        let shape = *shape;
        if !self.shapes.kind(shape).is_record() {
            return Err(invalid("Cannot look up fields in non-struct shapes"));
        }
        let Some((target, required)) = self.shapes.member(shape, name) else {
            return Err(invalid(format!("Member `{name}` doesn't exist")));
        };
        let is_union = matches!(self.shapes.kind(shape), ShapeKind::Union { .. });
        let ident = self.fresh("fld");
        let (code, output) = if is_union {
            // Unions select a variant; access is optional no matter what
            // the member metadata says.
            (
                format!("let {ident} = {}.as_{name}();\n", current.ident),
                TraversedShape::optional(TraversalType::Shape(target)),
            )
        } else if required {
            (
                format!("let {ident} = &{}.{name};\n", current.ident),
                TraversedShape::required(TraversalType::Shape(target)),
            )
        } else {
            (
                format!("let {ident} = {}.{name}.as_ref();\n", current.ident),
                TraversedShape::optional(TraversalType::Shape(target)),
            )
        };
        Ok(GeneratedTraversal {
            code,
            ident,
            output,
            ownership: Ownership::Reference,
        })
    }

    fn compile_subexpression(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let right = self.compile(right, &Scope::over(&left))?;
        Ok(GeneratedTraversal {
            code: format!("{}{}", left.code, right.code),
            ident: right.ident,
            output: right.output,
            ownership: right.ownership,
        })
    }

    fn compile_flatten(&mut self, inner: &Expr, scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        let inner = self.compile(inner, scope)?;
        let inner = self.unwrap_optional(inner);
        if let TraversalType::Tuple(entries) = &inner.output.ty {
            let entries = entries.clone();
            return self.flatten_tuple(inner, &entries);
        }
        let Some(element) = self.element_type(&inner.output.ty) else {
            return Err(invalid(
                "Left side of the flatten expression must result in a list",
            ));
        };
        let Some(inner_element) = self.element_type(&element) else {
            // Already flat: the flatten is a rebind, no code and the same
            // identifier, so the value keeps its runtime identity.
            return Ok(inner);
        };
        let ident = self.fresh("flt");
        let elem_ty = inner_element.render(false, None, self.shapes);
        let outer = if matches!(
            &inner.output.ty,
            TraversalType::Sequence { owned: false, .. }
        ) {
            ".iter().copied()"
        } else {
            ".iter()"
        };
        let tail = if matches!(&element, TraversalType::Sequence { owned: false, .. }) {
            ".copied()"
        } else {
            ""
        };
        let stmt = format!(
            "let {ident} = {}{outer}.flatten(){tail}.collect::<Vec<&{elem_ty}>>();\n",
            inner.ident
        );
        Ok(GeneratedTraversal {
            code: format!("{}{}", inner.code, stmt),
            ident,
            output: TraversedShape::required(TraversalType::sequence(inner_element, false)),
            ownership: Ownership::Value,
        })
    }

    /// Flatten over a heterogeneous multi-select result: all-numeric entries
    /// coerce to a common `f64` vector, anything else has no common
    /// representation.
    fn flatten_tuple(
        &mut self,
        tuple: GeneratedTraversal,
        entries: &[TupleEntry],
    ) -> TraversalResult<GeneratedTraversal> {
        let all_numeric = entries
            .iter()
            .all(|entry| matches!(self.family(&entry.ty), Family::Numeric { .. }));
        if !all_numeric {
            return Err(unsupported(
                "Flattening a heterogeneous multi-select list is not supported",
            ));
        }
        let ident = self.fresh("flt");
        let items: Vec<String> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let base = format!("{}.{index}", tuple.ident);
                let operand = Operand {
                    ident: &base,
                    ty: &entry.ty,
                    by_ref: entry.by_ref,
                };
                self.numeric_expr(&operand, true)
            })
            .collect();
        let stmt = format!("let {ident} = vec![{}];\n", items.join(", "));
        Ok(GeneratedTraversal {
            code: format!("{}{}", tuple.code, stmt),
            ident,
            output: TraversedShape::required(TraversalType::sequence(TraversalType::Float, true)),
            ownership: Ownership::Value,
        })
    }

    fn compile_projection(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let Some(element) = self.element_type(&left.output.ty) else {
            return Err(unsupported("Projections can only be done on lists"));
        };
        if right.is_current() {
            return Ok(left);
        }
        let steps = iteration_steps(&left.output.ty);
        let ident = self.fresh("prj");
        self.project_over(left, ident, steps, element, right)
    }

    fn compile_object_projection(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let TraversalType::Shape(shape) = &left.output.ty else {
            // Computed values have no declared key/value shape left to
            // verify against.
            return Err(unsupported(
                "Object projection cannot be done on computed maps",
            ));
        };
        let ShapeKind::Map { value, sparse, .. } = self.shapes.kind(*shape) else {
            return Err(unsupported("Object projection is only supported on map types"));
        };
        let (value, sparse) = (*value, *sparse);
        let value_ty = TraversalType::Shape(value);
        let ident = self.fresh("prj");
        if right.is_current() {
            let flatten = if sparse { ".flatten()" } else { "" };
            let elem_ty = value_ty.render(false, None, self.shapes);
            let stmt = format!(
                "let {ident} = {}.values(){flatten}.collect::<Vec<&{elem_ty}>>();\n",
                left.ident
            );
            return Ok(GeneratedTraversal {
                code: format!("{}{}", left.code, stmt),
                ident,
                output: TraversedShape::required(TraversalType::sequence(value_ty, false)),
                ownership: Ownership::Value,
            });
        }
        let steps: &[&str] = if sparse {
            &[".values()", ".flatten()"]
        } else {
            &[".values()"]
        };
        self.project_over(left, ident, steps, value_ty, right)
    }

    fn compile_filter(
        &mut self,
        left: &Expr,
        comparison: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let Some(element) = self.element_type(&left.output.ty) else {
            return Err(unsupported("Filter projections can only be done on lists"));
        };
        let steps = iteration_steps(&left.output.ty);
        let ident = self.fresh("fpr");
        let elem_value = element_value(&element);
        let predicate = self.compile(comparison, &Scope::over(&elem_value))?;
        // An absent predicate excludes the element, matching the normal
        // absence semantics of the surrounding accessor.
        let predicate = self.unwrap_optional(predicate);
        let cond = match &predicate.output.ty {
            TraversalType::Bool => predicate.ident.clone(),
            TraversalType::Shape(id) if matches!(self.shapes.kind(*id), ShapeKind::Boolean) => {
                format!("*{}", predicate.ident)
            }
            _ => {
                return Err(invalid(
                    "The filter expression comparison must result in a bool",
                ));
            }
        };
        let param_ty = element.render(false, Some("'a"), self.shapes);
        let collect_ty = element.render(false, None, self.shapes);
        let stmt = projection_stmt(
            &ident,
            &left.ident,
            steps,
            "keep",
            &format!("&'a {param_ty}"),
            &format!("Option<&'a {param_ty}>"),
            &predicate.code,
            &format!("if {cond} {{ Some(_v) }} else {{ None }}"),
            &format!("&{collect_ty}"),
        );
        let filtered = GeneratedTraversal {
            code: format!("{}{}", left.code, stmt),
            ident,
            output: TraversedShape::required(TraversalType::sequence(element.clone(), false)),
            ownership: Ownership::Value,
        };
        if right.is_current() {
            return Ok(filtered);
        }
        let ident = self.fresh("prj");
        self.project_over(filtered, ident, &[".iter()", ".copied()"], element, right)
    }

    /// Map `right` over the elements of `src`, dropping absent results.
    fn project_over(
        &mut self,
        src: GeneratedTraversal,
        ident: String,
        steps: &[&str],
        element: TraversalType,
        right: &Expr,
    ) -> TraversalResult<GeneratedTraversal> {
        let elem_value = element_value(&element);
        let mapped = self.compile(right, &Scope::over(&elem_value))?;
        let mapped_by_ref = mapped.ownership == Ownership::Reference;
        let param_ty = element.render(false, Some("'a"), self.shapes);
        let ret_ty = mapped.output.ty.render(mapped_by_ref, Some("'a"), self.shapes);
        let collect_ty = mapped.output.ty.render(mapped_by_ref, None, self.shapes);
        let tail = if mapped.output.optional {
            mapped.ident.clone()
        } else {
            format!("Some({})", mapped.ident)
        };
        let stmt = projection_stmt(
            &ident,
            &src.ident,
            steps,
            "map",
            &format!("&'a {param_ty}"),
            &format!("Option<{ret_ty}>"),
            &mapped.code,
            &tail,
            &collect_ty,
        );
        Ok(GeneratedTraversal {
            code: format!("{}{}", src.code, stmt),
            ident,
            output: TraversedShape::required(TraversalType::sequence(
                mapped.output.ty,
                !mapped_by_ref,
            )),
            ownership: Ownership::Value,
        })
    }

    fn compile_multi_select_list(
        &mut self,
        items: &[Expr],
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let mut code = String::new();
        let mut compiled = Vec::with_capacity(items.len());
        for item in items {
            let item = self.compile(item, scope)?;
            let item = self.unwrap_optional(item);
            code.push_str(&item.code);
            compiled.push(item);
        }
        let homogeneous = compiled
            .windows(2)
            .all(|pair| pair[0].output.ty == pair[1].output.ty && pair[0].ownership == pair[1].ownership);
        let idents: Vec<&str> = compiled.iter().map(|item| item.ident.as_str()).collect();
        let ident = self.fresh("msl");
        if homogeneous && let Some(first) = compiled.first() {
            code.push_str(&format!("let {ident} = vec![{}];\n", idents.join(", ")));
            Ok(GeneratedTraversal {
                code,
                ident,
                output: TraversedShape::required(TraversalType::sequence(
                    first.output.ty.clone(),
                    first.ownership == Ownership::Value,
                )),
                ownership: Ownership::Value,
            })
        } else {
            code.push_str(&format!("let {ident} = ({});\n", idents.join(", ")));
            let entries = compiled
                .iter()
                .map(|item| TupleEntry {
                    ty: item.output.ty.clone(),
                    by_ref: item.ownership == Ownership::Reference,
                })
                .collect();
            Ok(GeneratedTraversal {
                code,
                ident,
                output: TraversedShape::required(TraversalType::Tuple(entries)),
                ownership: Ownership::Value,
            })
        }
    }

    fn compile_boolean_op(
        &mut self,
        op: &str,
        tag: &str,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let right = self.compile(right, scope)?;
        let right = self.unwrap_optional(right);
        if self.family(&left.output.ty) != Family::Truth
            || self.family(&right.output.ty) != Family::Truth
        {
            return Err(unsupported(format!(
                "Non-boolean operands cannot be used with `{op}`"
            )));
        }
        let left_expr = deref(&operand(&left));
        let right_expr = deref(&operand(&right));
        let ident = self.fresh(tag);
        let code = format!(
            "{}{}let {ident} = {left_expr} {op} {right_expr};\n",
            left.code, right.code
        );
        Ok(computed_bool(code, ident))
    }

    fn compile_not(&mut self, inner: &Expr, scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        let inner = self.compile(inner, scope)?;
        let inner = self.unwrap_optional(inner);
        if self.family(&inner.output.ty) != Family::Truth {
            return Err(unsupported("Non-boolean operands cannot be used with `!`"));
        }
        let inner_expr = deref(&operand(&inner));
        let ident = self.fresh("not");
        let code = format!("{}let {ident} = !{inner_expr};\n", inner.code);
        Ok(computed_bool(code, ident))
    }

    fn compile_comparison(
        &mut self,
        op: &str,
        left: &Expr,
        right: &Expr,
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        let left = self.compile(left, scope)?;
        let left = self.unwrap_optional(left);
        let right = self.compile(right, scope)?;
        let right = self.unwrap_optional(right);
        let (left_expr, right_expr) = self.comparison_exprs(&operand(&left), &operand(&right))?;
        let ident = self.fresh("cmp");
        let code = format!(
            "{}{}let {ident} = {left_expr} {op} {right_expr};\n",
            left.code, right.code
        );
        Ok(computed_bool(code, ident))
    }

    fn compile_function(
        &mut self,
        name: &str,
        args: &[Expr],
        scope: &Scope,
    ) -> TraversalResult<GeneratedTraversal> {
        match name {
            "length" => {
                let [arg] = args else {
                    return Err(invalid("The `length` function takes exactly one argument"));
                };
                let arg = self.compile(arg, scope)?;
                let arg = self.unwrap_optional(arg);
                let lengthy = match &arg.output.ty {
                    TraversalType::Sequence { .. } | TraversalType::Str => true,
                    TraversalType::Shape(id) => matches!(
                        self.shapes.kind(*id),
                        ShapeKind::List { .. } | ShapeKind::String
                    ),
                    _ => false,
                };
                if !lengthy {
                    return Err(invalid("The argument to `length` must be a list or string"));
                }
                let ident = self.fresh("len");
                let code = format!("{}let {ident} = {}.len();\n", arg.code, arg.ident);
                Ok(GeneratedTraversal {
                    code,
                    ident,
                    output: TraversedShape::required(TraversalType::Count),
                    ownership: Ownership::Value,
                })
            }
            "keys" => {
                let [arg] = args else {
                    return Err(invalid("The `keys` function takes exactly one argument"));
                };
                let arg = self.compile(arg, scope)?;
                let arg = self.unwrap_optional(arg);
                let TraversalType::Shape(shape) = &arg.output.ty else {
                    return Err(invalid("The argument to `keys` must be a map"));
                };
                let ShapeKind::Map { key, .. } = self.shapes.kind(*shape) else {
                    return Err(invalid("The argument to `keys` must be a map"));
                };
                let key = *key;
                let ident = self.fresh("keys");
                let key_ty = self.shapes.rust_type(key);
                let code = format!(
                    "{}let {ident} = {}.keys().collect::<Vec<&{key_ty}>>();\n",
                    arg.code, arg.ident
                );
                Ok(GeneratedTraversal {
                    code,
                    ident,
                    output: TraversedShape::required(TraversalType::sequence(
                        TraversalType::Shape(key),
                        false,
                    )),
                    ownership: Ownership::Value,
                })
            }
            "contains" => self.compile_contains(args, scope),
            _ => Err(unsupported(format!("The `{name}` function is not supported"))),
        }
    }

    fn compile_contains(&mut self, args: &[Expr], scope: &Scope) -> TraversalResult<GeneratedTraversal> {
        let [collection, needle] = args else {
            return Err(invalid("The `contains` function takes exactly two arguments"));
        };
        if matches!(needle, Expr::Literal(Literal::Null)) {
            return Err(unsupported(
                "Checking for `null` with `contains` is not supported",
            ));
        }
        let collection = self.compile(collection, scope)?;
        let collection = self.unwrap_optional(collection);
        let needle = self.compile(needle, scope)?;
        let needle = self.unwrap_optional(needle);

        let stringy = match &collection.output.ty {
            TraversalType::Str => true,
            TraversalType::Shape(id) => matches!(self.shapes.kind(*id), ShapeKind::String),
            _ => false,
        };
        if stringy {
            if self.family(&needle.output.ty) != Family::Text {
                return Err(unsupported(format!(
                    "Comparison of `&str` with `{}` is not supported",
                    self.display_type(&needle.output.ty)
                )));
            }
            let haystack = self.text_expr(&operand(&collection));
            let needle_expr = self.text_expr(&operand(&needle));
            let ident = self.fresh("cnt");
            let code = format!(
                "{}{}let {ident} = {haystack}.contains({needle_expr});\n",
                collection.code, needle.code
            );
            return Ok(computed_bool(code, ident));
        }

        let Some(element) = self.element_type(&collection.output.ty) else {
            return Err(invalid(
                "The first argument to `contains` must be a list or string",
            ));
        };
        let elem_operand = Operand {
            ident: "_v",
            ty: &element,
            by_ref: true,
        };
        let (elem_expr, needle_expr) = self.comparison_exprs(&elem_operand, &operand(&needle))?;
        let steps = iteration_steps(&collection.output.ty).concat();
        let ident = self.fresh("cnt");
        let code = format!(
            "{}{}let {ident} = {}{steps}.any(|_v| {elem_expr} == {needle_expr});\n",
            collection.code, needle.code, collection.ident
        );
        Ok(computed_bool(code, ident))
    }

    fn compile_literal(&mut self, literal: &Literal) -> TraversalResult<GeneratedTraversal> {
        let (stmt, ty) = match literal {
            Literal::Bool(value) => (format!("{value}"), TraversalType::Bool),
            Literal::Number(value) => (format!("{value}f64"), TraversalType::Float),
            Literal::String(value) => (format!("{value:?}"), TraversalType::Str),
            Literal::Null => return Err(unsupported("Literal `null` values are not supported")),
            Literal::Array => return Err(unsupported("Literal array values are not supported")),
            Literal::Object => return Err(unsupported("Literal object values are not supported")),
        };
        let ident = self.fresh("lit");
        Ok(GeneratedTraversal {
            code: format!("let {ident} = {stmt};\n"),
            ident,
            output: TraversedShape::required(ty),
            ownership: Ownership::Value,
        })
    }

    /// Shadowing rebind that peels the `Option` off an optional value.
    /// Emitted by the consumer of the value, at the point further access
    /// actually needs it.
    fn unwrap_optional(&self, mut value: GeneratedTraversal) -> GeneratedTraversal {
        if value.output.optional {
            value
                .code
                .push_str(&format!("let {id} = {id}?;\n", id = value.ident));
            value.output.optional = false;
        }
        value
    }

    fn element_type(&self, ty: &TraversalType) -> Option<TraversalType> {
        match ty {
            TraversalType::Shape(id) => self.shapes.element(*id).map(TraversalType::Shape),
            TraversalType::Sequence { element, .. } => Some((**element).clone()),
            _ => None,
        }
    }

    fn family(&self, ty: &TraversalType) -> Family {
        match ty {
            TraversalType::Shape(id) => match self.shapes.kind(*id) {
                ShapeKind::Number(kind) => Family::Numeric {
                    float: kind.is_float(),
                },
                ShapeKind::IntEnum { .. } => Family::Numeric { float: false },
                ShapeKind::String | ShapeKind::Enum { .. } => Family::Text,
                ShapeKind::Boolean => Family::Truth,
                _ => Family::Other,
            },
            TraversalType::Float => Family::Numeric { float: true },
            TraversalType::Count => Family::Numeric { float: false },
            TraversalType::Str => Family::Text,
            TraversalType::Bool => Family::Truth,
            _ => Family::Other,
        }
    }

    /// Render both sides of a comparison, or reject the pairing. Numeric
    /// operands widen to `i64`, or to `f64` as soon as either side is
    /// floating; string-family operands render as `&str`.
    fn comparison_exprs(
        &self,
        left: &Operand,
        right: &Operand,
    ) -> TraversalResult<(String, String)> {
        match (self.family(left.ty), self.family(right.ty)) {
            (Family::Numeric { float: lf }, Family::Numeric { float: rf }) => {
                let float = lf || rf;
                Ok((
                    self.numeric_expr(left, float),
                    self.numeric_expr(right, float),
                ))
            }
            (Family::Text, Family::Text) => Ok((self.text_expr(left), self.text_expr(right))),
            (Family::Truth, Family::Truth) => Ok((deref(left), deref(right))),
            _ => Err(unsupported(format!(
                "Comparison of `{}` with `{}` is not supported",
                self.display_type(left.ty),
                self.display_type(right.ty)
            ))),
        }
    }

    fn numeric_expr(&self, op: &Operand, float: bool) -> String {
        let target = if float { "f64" } else { "i64" };
        match op.ty {
            TraversalType::Shape(id) => match self.shapes.kind(*id) {
                ShapeKind::Number(_) => format!("{} as {target}", deref(op)),
                ShapeKind::IntEnum { .. } => format!("{}.as_i32() as {target}", op.ident),
                _ => deref(op),
            },
            // Number literals are already f64; float mode is guaranteed.
            TraversalType::Float => deref(op),
            TraversalType::Count => format!("{} as {target}", deref(op)),
            _ => deref(op),
        }
    }

    fn text_expr(&self, op: &Operand) -> String {
        match op.ty {
            TraversalType::Shape(id) => match self.shapes.kind(*id) {
                ShapeKind::String | ShapeKind::Enum { .. } => format!("{}.as_str()", op.ident),
                _ => deref(op),
            },
            _ => deref(op),
        }
    }

    fn display_type(&self, ty: &TraversalType) -> String {
        ty.render(false, None, self.shapes)
    }

    fn fresh(&mut self, tag: &str) -> String {
        self.names += 1;
        format!("_{tag}_{}", self.names)
    }
}

fn computed_bool(code: String, ident: String) -> GeneratedTraversal {
    GeneratedTraversal {
        code,
        ident,
        output: TraversedShape::required(TraversalType::Bool),
        ownership: Ownership::Value,
    }
}

/// The per-element value a projection or filter body compiles against.
fn element_value(element: &TraversalType) -> GeneratedTraversal {
    GeneratedTraversal {
        code: String::new(),
        ident: "_v".to_string(),
        output: TraversedShape::required(element.clone()),
        ownership: Ownership::Reference,
    }
}

/// Iterator steps that yield one-`&`-deep elements for any list value:
/// declared lists are `&Vec<T>`, computed sequences are `Vec<&T>` (copied
/// back down) or `Vec<T>`.
fn iteration_steps(ty: &TraversalType) -> &'static [&'static str] {
    if matches!(ty, TraversalType::Sequence { owned: false, .. }) {
        &[".iter()", ".copied()"]
    } else {
        &[".iter()"]
    }
}

fn deref(op: &Operand) -> String {
    if op.by_ref {
        format!("*{}", op.ident)
    } else {
        op.ident.to_string()
    }
}

fn projection_stmt(
    ident: &str,
    src: &str,
    steps: &[&str],
    fn_name: &str,
    param_ty: &str,
    ret_ty: &str,
    body: &str,
    tail: &str,
    collect_ty: &str,
) -> String {
    let mut out = format!("let {ident} = {src}\n");
    for step in steps {
        out.push_str(&format!("    {step}\n"));
    }
    out.push_str("    .flat_map({\n");
    out.push_str(&format!(
        "        fn {fn_name}<'a>(_v: {param_ty}) -> {ret_ty} {{\n"
    ));
    out.push_str(&indent(body, 12));
    out.push_str(&format!("            {tail}\n"));
    out.push_str("        }\n");
    out.push_str(&format!("        {fn_name}\n"));
    out.push_str("    })\n");
    out.push_str(&format!("    .collect::<Vec<{collect_ty}>>();\n"));
    out
}

fn indent(code: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut out = String::new();
    for line in code.lines() {
        out.push_str(&pad);
        out.push_str(line);
        out.push('\n');
    }
    out
}
