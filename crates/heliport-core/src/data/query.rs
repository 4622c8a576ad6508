//! Table queries in the data service's URL dialect.
//!
//! `Query::table("bookings").eq("user_id", id).order("created_at", Order::Desc).limit(5)`
//! becomes `select=*&user_id=eq.<id>&order=created_at.desc&limit=5`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Keep rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Query-string pairs, unencoded. The HTTP client encodes them.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().cloned());
        if let Some((ref column, order)) = self.order {
            params.push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &Query) -> Vec<String> {
        query
            .params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }

    #[test]
    fn test_select_all_by_default() {
        let query = Query::table("routes");
        assert_eq!(query.table_name(), "routes");
        assert_eq!(pairs(&query), vec!["select=*"]);
    }

    #[test]
    fn test_filter_order_limit() {
        let query = Query::table("order_history")
            .eq("user_id", "abc")
            .order("created_at", Order::Desc)
            .limit(10);
        assert_eq!(
            pairs(&query),
            vec!["select=*", "user_id=eq.abc", "order=created_at.desc", "limit=10"]
        );
    }

    #[test]
    fn test_custom_columns_and_multiple_filters() {
        let query = Query::table("helicopters")
            .select("id,name")
            .eq("status", "available")
            .eq("capacity", "6")
            .order("name", Order::Asc);
        assert_eq!(
            pairs(&query),
            vec!["select=id,name", "status=eq.available", "capacity=eq.6", "order=name.asc"]
        );
    }
}
