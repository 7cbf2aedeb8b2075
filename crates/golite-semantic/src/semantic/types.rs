/// Semantic type representation.
///
/// One canonical closed variant set, separate from the syntactic
/// `TypeExpr` so the analyzer can reason about types without caring about
/// spans or surface syntax. Aliases own their fully resolved target, so an
/// alias chain can never form a cycle once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    // -- Primitives --
    Bool,
    Int,
    Float64,
    Rune,
    String,

    // -- Composites --
    /// Fixed-size array with a compile-time bound.
    Array(Box<Type>, usize),
    Slice(Box<Type>),
    /// Order-sensitive field sequence; names are unique within one struct.
    Struct(Vec<Field>),

    /// A declared named type: `type T int` yields `Alias("T", Int)`.
    /// Equality (`==`) is named-type identity: the alias name matters.
    Alias(String, Box<Type>),

    /// A function signature. `ret` is `Void` for value-less functions.
    Function { params: Vec<Type>, ret: Box<Type> },

    /// The "type" of a call to a function with no return value.
    Void,

    /// Placeholder for a global whose type awaits inference from its
    /// initializer (two-phase resolution).
    ToBeInferred,
}

/// A struct field: name and type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Type {
    /// The underlying type: all alias indirections fully resolved,
    /// recursively through array/slice element and struct field types.
    pub fn underlying(&self) -> Type {
        match self {
            Type::Alias(_, target) => target.underlying(),
            Type::Array(elem, bound) => Type::Array(Box::new(elem.underlying()), *bound),
            Type::Slice(elem) => Type::Slice(Box::new(elem.underlying())),
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        ty: f.ty.underlying(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Follow top-level alias links only, leaving element and field types
    /// as declared. Used where the shape of the type matters but member
    /// types should keep their names (field access, indexing, append).
    pub fn resolve_alias(&self) -> &Type {
        let mut t = self;
        while let Type::Alias(_, target) = t {
            t = target;
        }
        t
    }

    /// Whether `underlying(self)` contains a slice anywhere. Such types are
    /// not comparable with `==`/`!=`.
    pub fn contains_slice(&self) -> bool {
        match self {
            Type::Slice(_) => true,
            Type::Alias(_, target) => target.contains_slice(),
            Type::Array(elem, _) => elem.contains_slice(),
            Type::Struct(fields) => fields.iter().any(|f| f.ty.contains_slice()),
            _ => false,
        }
    }

    /// Symmetric compatibility: the underlying types are structurally
    /// equal. Two distinct named aliases over the same structure are
    /// incompatible as named types (`==`) but compatible here.
    pub fn compatible(&self, other: &Type) -> bool {
        self.underlying() == other.underlying()
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float64 => write!(f, "float64"),
            Type::Rune => write!(f, "rune"),
            Type::String => write!(f, "string"),
            Type::Array(elem, bound) => write!(f, "[{}]{}", bound, elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Struct(fields) => {
                write!(f, "struct {{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{} {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            Type::Alias(name, _) => write!(f, "{}", name),
            Type::Function { params, ret } => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                if **ret != Type::Void {
                    write!(f, " {}", ret)?;
                }
                Ok(())
            }
            Type::Void => write!(f, "void"),
            Type::ToBeInferred => write!(f, "<inferred>"),
        }
    }
}
