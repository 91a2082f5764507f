//! Abstract columns.
//!
//! An abstract column is a symbolic reference to a value extractable from a
//! row: a simple column id, an aggregation over a simple column, or a scalar
//! function over other abstract columns. Every variant must be handled in
//! the match arms below - the compiler enforces this.

use serde::{Deserialize, Serialize};

use crate::engine::lookup::ColumnLookup;
use crate::error::{InvalidQueryCode, QueryError, QueryResult};
use crate::query::scalar::ScalarFunction;
use crate::table::{DataTable, TableRow};
use crate::value::{Value, ValueType};

/// Separator between an aggregation code and its target id: `sum-amount`.
const AGGREGATION_SEPARATOR: &str = "-";
/// Separator between a function name and its argument ids: `year_date`.
const FUNCTION_SEPARATOR: &str = "_";
/// Separator between argument ids: `sum_a,b`.
const ARGUMENT_SEPARATOR: &str = ",";

/// Aggregation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationType {
    /// The canonical lowercase code used in ids and query strings.
    pub fn code(&self) -> &'static str {
        match self {
            AggregationType::Count => "count",
            AggregationType::Sum => "sum",
            AggregationType::Avg => "avg",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
        }
    }

    /// Parse a code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "count" => Some(AggregationType::Count),
            "sum" => Some(AggregationType::Sum),
            "avg" => Some(AggregationType::Avg),
            "min" => Some(AggregationType::Min),
            "max" => Some(AggregationType::Max),
            _ => None,
        }
    }
}

impl std::fmt::Display for AggregationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A reference to a table column by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleColumn {
    id: String,
}

impl SimpleColumn {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// An aggregation over a simple column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationColumn {
    column: SimpleColumn,
    aggregation: AggregationType,
}

impl AggregationColumn {
    pub fn new(column: SimpleColumn, aggregation: AggregationType) -> Self {
        Self {
            column,
            aggregation,
        }
    }

    pub fn column(&self) -> &SimpleColumn {
        &self.column
    }

    pub fn aggregation(&self) -> AggregationType {
        self.aggregation
    }

    /// `sum-amount`.
    pub fn id(&self) -> String {
        format!(
            "{}{}{}",
            self.aggregation.code(),
            AGGREGATION_SEPARATOR,
            self.column.id()
        )
    }

    /// The result type for a target of the given type. COUNT / SUM / AVG
    /// always produce NUMBER; MIN / MAX keep the target type.
    pub fn result_type(&self, target_type: ValueType) -> ValueType {
        match self.aggregation {
            AggregationType::Count | AggregationType::Sum | AggregationType::Avg => {
                ValueType::Number
            }
            AggregationType::Min | AggregationType::Max => target_type,
        }
    }
}

/// A scalar function applied to abstract columns. Arbitrary nesting is
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarFunctionColumn {
    function: ScalarFunction,
    arguments: Vec<AbstractColumn>,
}

impl ScalarFunctionColumn {
    pub fn new(function: ScalarFunction, arguments: Vec<AbstractColumn>) -> Self {
        Self {
            function,
            arguments,
        }
    }

    pub fn function(&self) -> &ScalarFunction {
        &self.function
    }

    pub fn arguments(&self) -> &[AbstractColumn] {
        &self.arguments
    }

    /// `year_date`, `sum_a,b`; zero-argument functions use the bare name,
    /// and constants embed their value so distinct constants get distinct
    /// ids.
    pub fn id(&self) -> String {
        if let ScalarFunction::Constant(value) = &self.function {
            return format!("constant{FUNCTION_SEPARATOR}{value}");
        }
        if self.arguments.is_empty() {
            return self.function.name().to_string();
        }
        let args: Vec<String> = self.arguments.iter().map(|a| a.id()).collect();
        format!(
            "{}{}{}",
            self.function.name(),
            FUNCTION_SEPARATOR,
            args.join(ARGUMENT_SEPARATOR)
        )
    }
}

/// Symbolic reference to a value extractable from a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractColumn {
    Simple(SimpleColumn),
    Aggregation(AggregationColumn),
    ScalarFunction(ScalarFunctionColumn),
}

impl AbstractColumn {
    /// Shorthand for a simple column reference.
    pub fn simple(id: impl Into<String>) -> Self {
        AbstractColumn::Simple(SimpleColumn::new(id))
    }

    /// Shorthand for an aggregation over a simple column.
    pub fn aggregation(aggregation: AggregationType, target: impl Into<String>) -> Self {
        AbstractColumn::Aggregation(AggregationColumn::new(
            SimpleColumn::new(target),
            aggregation,
        ))
    }

    /// Shorthand for a scalar-function column.
    pub fn scalar(function: ScalarFunction, arguments: Vec<AbstractColumn>) -> Self {
        AbstractColumn::ScalarFunction(ScalarFunctionColumn::new(function, arguments))
    }

    /// The generated id that identifies this column across pipeline stages.
    pub fn id(&self) -> String {
        match self {
            AbstractColumn::Simple(c) => c.id().to_string(),
            AbstractColumn::Aggregation(c) => c.id(),
            AbstractColumn::ScalarFunction(c) => c.id(),
        }
    }

    /// A display label synthesized from the column structure. Projection
    /// keeps the source table's label for simple columns; this label is used
    /// for columns the engine synthesizes.
    pub fn label(&self) -> String {
        match self {
            AbstractColumn::Simple(c) => c.id().to_string(),
            AbstractColumn::Aggregation(c) => c.id(),
            AbstractColumn::ScalarFunction(_) => {
                self.to_query_string().unwrap_or_else(|_| self.id())
            }
        }
    }

    /// The value type this column produces against the given table schema.
    pub fn value_type(&self, table: &DataTable) -> QueryResult<ValueType> {
        match self {
            AbstractColumn::Simple(c) => table
                .column_by_id(c.id())
                .map(|col| col.value_type())
                .ok_or_else(|| no_column_error(c.id())),
            AbstractColumn::Aggregation(c) => {
                let target = table
                    .column_by_id(c.column().id())
                    .ok_or_else(|| no_column_error(c.column().id()))?;
                Ok(c.result_type(target.value_type()))
            }
            AbstractColumn::ScalarFunction(c) => {
                let arg_types = c
                    .arguments()
                    .iter()
                    .map(|a| a.value_type(table))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(c.function().return_type(&arg_types))
            }
        }
    }

    /// Validate this column against a table schema: referenced ids exist,
    /// ids are well formed, aggregation and scalar-function typing rules
    /// hold. Recursive over scalar-function arguments.
    pub fn validate(&self, table: &DataTable) -> QueryResult<()> {
        match self {
            AbstractColumn::Simple(c) => {
                if c.id().contains('`') {
                    return Err(QueryError::invalid_query(
                        InvalidQueryCode::InvalidColumnId,
                        format!("Column id '{}' contains a backtick.", c.id()),
                    ));
                }
                if table.column_by_id(c.id()).is_none() {
                    return Err(no_column_error(c.id()));
                }
                Ok(())
            }
            AbstractColumn::Aggregation(c) => {
                AbstractColumn::Simple(c.column().clone()).validate(table)?;
                let target_type = table
                    .column_by_id(c.column().id())
                    .map(|col| col.value_type())
                    .ok_or_else(|| no_column_error(c.column().id()))?;
                match c.aggregation() {
                    AggregationType::Sum | AggregationType::Avg
                        if target_type != ValueType::Number =>
                    {
                        Err(QueryError::invalid_query(
                            InvalidQueryCode::AvgSumOnlyNumeric,
                            format!(
                                "Aggregation '{}' can only be applied to numeric columns, \
                                 but column '{}' has type {}.",
                                c.aggregation(),
                                c.column().id(),
                                target_type
                            ),
                        ))
                    }
                    _ => Ok(()),
                }
            }
            AbstractColumn::ScalarFunction(c) => {
                for arg in c.arguments() {
                    arg.validate(table)?;
                }
                let arg_types = c
                    .arguments()
                    .iter()
                    .map(|a| a.value_type(table))
                    .collect::<QueryResult<Vec<_>>>()?;
                c.function().validate(&arg_types)
            }
        }
    }

    /// All simple columns referenced, recursively. Returns owned copies so
    /// pipeline transformations stay independent.
    pub fn all_simple_columns(&self) -> Vec<SimpleColumn> {
        match self {
            AbstractColumn::Simple(c) => vec![c.clone()],
            AbstractColumn::Aggregation(c) => vec![c.column().clone()],
            AbstractColumn::ScalarFunction(c) => c
                .arguments()
                .iter()
                .flat_map(|a| a.all_simple_columns())
                .collect(),
        }
    }

    /// All aggregation columns referenced, recursively.
    pub fn all_aggregation_columns(&self) -> Vec<AggregationColumn> {
        match self {
            AbstractColumn::Simple(_) => vec![],
            AbstractColumn::Aggregation(c) => vec![c.clone()],
            AbstractColumn::ScalarFunction(c) => c
                .arguments()
                .iter()
                .flat_map(|a| a.all_aggregation_columns())
                .collect(),
        }
    }

    /// All scalar-function columns, including this column itself when it is
    /// one.
    pub fn all_scalar_function_columns(&self) -> Vec<ScalarFunctionColumn> {
        match self {
            AbstractColumn::Simple(_) | AbstractColumn::Aggregation(_) => vec![],
            AbstractColumn::ScalarFunction(c) => {
                let mut all: Vec<ScalarFunctionColumn> = c
                    .arguments()
                    .iter()
                    .flat_map(|a| a.all_scalar_function_columns())
                    .collect();
                all.push(c.clone());
                all
            }
        }
    }

    /// The value of this column for a row, resolved through a lookup.
    ///
    /// Columns the lookup knows (simple columns, anything materialized by an
    /// earlier stage) read their cell directly; scalar functions not yet
    /// materialized evaluate their arguments recursively.
    pub fn value(&self, lookup: &dyn ColumnLookup, row: &TableRow) -> QueryResult<Value> {
        if let Some(index) = lookup.column_index(self) {
            return row
                .cell(index)
                .map(|c| c.value().clone())
                .ok_or_else(|| QueryError::Internal(format!("row has no cell at index {index}")));
        }
        match self {
            AbstractColumn::ScalarFunction(c) => {
                let args = c
                    .arguments()
                    .iter()
                    .map(|a| a.value(lookup, row))
                    .collect::<QueryResult<Vec<_>>>()?;
                c.function().evaluate(&args)
            }
            other => Err(QueryError::Internal(format!(
                "column '{}' is not addressable at this stage",
                other.id()
            ))),
        }
    }

    /// Render the query-language form: `` `id` ``, ``sum(`amount`)``,
    /// ``year(`date`)``, ``(`a` + `b`)``.
    pub fn to_query_string(&self) -> QueryResult<String> {
        match self {
            AbstractColumn::Simple(c) => quote_id(c.id()),
            AbstractColumn::Aggregation(c) => Ok(format!(
                "{}({})",
                c.aggregation().code(),
                quote_id(c.column().id())?
            )),
            AbstractColumn::ScalarFunction(c) => {
                let args = c
                    .arguments()
                    .iter()
                    .map(|a| a.to_query_string())
                    .collect::<QueryResult<Vec<_>>>()?;
                c.function().to_query_string(&args)
            }
        }
    }
}

/// Backtick-quote a column id. Ids containing a backtick cannot be written
/// in the query language at all.
pub(crate) fn quote_id(id: &str) -> QueryResult<String> {
    if id.contains('`') {
        return Err(QueryError::Internal(format!(
            "column id '{id}' contains a backtick and cannot be quoted"
        )));
    }
    Ok(format!("`{id}`"))
}

fn no_column_error(id: &str) -> QueryError {
    QueryError::invalid_query(
        InvalidQueryCode::NoColumn,
        format!("Column '{id}' does not exist in table."),
    )
}
