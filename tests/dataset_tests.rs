//! Dataset loading tests

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use row_mapper::dataset::{DataRelation, DataSet, DataSetError};
use row_mapper::mapping::{Catalog, FieldSet, Mappable, Mapper, MappingError};
use row_mapper::value::Value;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn write_fixture(json: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.to_string().as_bytes()).unwrap();
    file
}

fn orders_document() -> serde_json::Value {
    serde_json::json!({
        "name": "orders",
        "tables": [
            {
                "name": "Customers",
                "columns": [
                    { "name": "Region", "data_type": "text", "nullable": false },
                    { "name": "Number", "data_type": "int", "nullable": false },
                    { "name": "Name", "data_type": "text" }
                ],
                "rows": [["EU", 1, "Ada"], ["US", 1, "Grace"]]
            },
            {
                "name": "Orders",
                "columns": [
                    { "name": "Id", "data_type": "uuid", "nullable": false },
                    { "name": "Region", "data_type": "text" },
                    { "name": "Customer", "data_type": "int" },
                    { "name": "Placed", "data_type": "date" },
                    { "name": "Total", "data_type": "float" }
                ],
                "rows": [
                    ["6f9619ff-8b86-d011-b42d-00cf4fc964ff", "US", 1, "2024-03-01", "19.5"],
                    ["7f9619ff-8b86-d011-b42d-00cf4fc964ff", "EU", 1, "2024-03-02", 4],
                    ["8f9619ff-8b86-d011-b42d-00cf4fc964ff", null, null, null, null]
                ]
            }
        ],
        "relations": [
            {
                "name": "CustomerOrders",
                "parent_table": "Customers",
                "parent_columns": ["Region", "Number"],
                "child_table": "Orders",
                "child_columns": ["Region", "Customer"]
            }
        ]
    })
}

#[derive(Debug, Default)]
struct Customer {
    name: String,
}

impl Mappable for Customer {
    fn describe(fields: &mut FieldSet<Self>) {
        fields.scalar("Name", |c| &mut c.name);
    }
}

#[derive(Debug, Default)]
struct Order {
    id: Uuid,
    placed: Option<NaiveDate>,
    total: f64,
    customer: Option<Customer>,
}

impl Mappable for Order {
    fn describe(fields: &mut FieldSet<Self>) {
        fields.scalar("Id", |o| &mut o.id);
        fields.scalar("Placed", |o| &mut o.placed);
        fields.scalar("Total", |o| &mut o.total);
        fields.object("Customer", |o| &mut o.customer).relation("CustomerOrders");
    }
}

mod load_tests {
    use super::*;

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let file = write_fixture(&orders_document());
        let dataset = DataSet::from_json_file(file.path())?;

        assert_eq!(dataset.name, "orders");
        assert_eq!(dataset.tables().len(), 2);
        assert_eq!(dataset.relations().len(), 1);

        let orders = dataset.table("Orders").unwrap();
        assert_eq!(orders.row_count(), 3);
        assert_eq!(
            orders.row_values(0).unwrap()[3],
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(orders.row_values(0).unwrap()[4], Value::Float(19.5));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = DataSet::from_json_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(DataSetError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            DataSet::from_json("{ not json"),
            Err(DataSetError::JsonError(_))
        ));

        let mut document = orders_document();
        document["relations"][0]["child_columns"] = serde_json::json!(["Region"]);
        assert!(matches!(
            DataSet::from_json(&document.to_string()),
            Err(DataSetError::InvalidRelation { .. })
        ));

        let mut document = orders_document();
        document["tables"][1]["rows"][0][0] = serde_json::json!("not-a-uuid");
        assert!(matches!(
            DataSet::from_json(&document.to_string()),
            Err(DataSetError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_composite_key_relation() {
        let dataset = DataSet::from_json(&orders_document().to_string()).unwrap();

        let first = dataset.row("Orders", 0).unwrap();
        let customer = first.parent_row("CustomerOrders").unwrap().unwrap();
        assert_eq!(customer.get("Name"), Some(&Value::from("Grace")));

        let orphan = dataset.row("Orders", 2).unwrap();
        assert!(orphan.parent_row("CustomerOrders").unwrap().is_none());

        let ada = dataset.row("Customers", 0).unwrap();
        let orders = ada.child_rows("CustomerOrders").unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].index(), 1);
    }

    #[test]
    fn test_duplicate_relation_rejected() {
        let mut dataset = DataSet::from_json(&orders_document().to_string()).unwrap();
        let duplicate = DataRelation::with_columns(
            "CustomerOrders",
            "Customers",
            vec!["Region".to_string()],
            "Orders",
            vec!["Region".to_string()],
        );
        assert!(matches!(
            dataset.add_relation(duplicate),
            Err(DataSetError::DuplicateRelation(_))
        ));
    }
}

mod end_to_end_tests {
    use super::*;

    #[test]
    fn test_map_loaded_dataset() {
        let file = write_fixture(&orders_document());
        let dataset = DataSet::from_json_file(file.path()).unwrap();
        let mapper = Mapper::with_catalog(Arc::new(Catalog::new()));

        let orders: Vec<Order> = mapper.map_table(&dataset, "Orders", None).unwrap();
        assert_eq!(orders.len(), 3);

        assert_eq!(
            orders[0].id,
            Uuid::parse_str("6f9619ff-8b86-d011-b42d-00cf4fc964ff").unwrap()
        );
        assert_eq!(orders[0].placed, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(orders[0].total, 19.5);
        assert_eq!(orders[0].customer.as_ref().unwrap().name, "Grace");

        assert_eq!(orders[1].total, 4.0);
        assert_eq!(orders[1].customer.as_ref().unwrap().name, "Ada");

        assert_eq!(orders[2].placed, None);
        assert_eq!(orders[2].total, 0.0);
        assert!(orders[2].customer.is_none());
    }

    #[test]
    fn test_map_by_table_index() {
        let dataset = DataSet::from_json(&orders_document().to_string()).unwrap();
        let mapper = Mapper::with_catalog(Arc::new(Catalog::new()));

        let customers: Vec<Customer> = mapper.map_table(&dataset, 0usize, None).unwrap();
        let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);

        assert!(matches!(
            mapper.map_table::<Customer>(&dataset, 5usize, None),
            Err(MappingError::TableNotFound(_))
        ));
    }
}
