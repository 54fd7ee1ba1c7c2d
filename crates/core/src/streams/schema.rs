//! JSON schema declarations per entity
//!
//! Field lists follow the vendor payloads. All fields are nullable; the
//! vendor omits or nulls most of them depending on the entity's state.

use serde_json::{json, Map, Value};

fn integer() -> Value {
    json!({ "type": ["integer", "null"] })
}

fn number() -> Value {
    json!({ "type": ["number", "null"] })
}

fn string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn boolean() -> Value {
    json!({ "type": ["boolean", "null"] })
}

fn date_time() -> Value {
    json!({ "type": ["string", "null"], "format": "date-time" })
}

fn object(properties: Map<String, Value>) -> Value {
    json!({ "type": "object", "properties": properties })
}

fn array_of(items: Value) -> Value {
    json!({ "type": ["array", "null"], "items": items })
}

macro_rules! props {
    ($($name:literal => $kind:expr),* $(,)?) => {{
        let mut map = Map::new();
        $(map.insert($name.to_string(), $kind);)*
        map
    }};
}

/// Schema for the products stream.
#[must_use]
pub fn products() -> Value {
    object(props! {
        "productId" => integer(),
        "groupId" => integer(),
        "brandId" => integer(),
        "brancheId" => integer(),
        "productNumber" => string(),
        "productType" => string(),
        "productKindId" => integer(),
        "productDescription" => string(),
        "productSubdescription" => string(),
        "additionalInfo" => string(),
        "useStock" => boolean(),
        "salesVisibilityId" => integer(),
        "availabilityStatusId" => integer(),
        "creationDatetime" => date_time(),
        "allowInvoiceDiscount" => boolean(),
        "lastModified" => date_time(),
        "isModified" => boolean(),
        "productGuid" => string(),
        "memoCommon" => string(),
        "memoEcommerce" => string(),
        "isDeleted" => boolean(),
        "productSize" => string(),
        "modelSeason" => string(),
        "productColor" => string(),
        "useGroupInvoiceDiscount" => boolean(),
        "salesUnitId" => integer(),
        "salesUnitQuantity" => number(),
        "hintInfo" => string(),
        "productSearchCode" => string(),
        "isBaseProduct" => boolean(),
        "deliveryFromWarehouse" => integer(),
        "purchaseFromWarehouse" => integer(),
        "viaCollectionWarehouse" => integer(),
        "bebat" => integer(),
        "extraCostQuantity" => number(),
        "assortmentCode" => string(),
        "modifiedBy" => string(),
        "createdBy" => string(),
        "originCountryCode" => string(),
        "originCountry" => string(),
    })
}

/// Schema for the suppliers stream.
#[must_use]
pub fn suppliers() -> Value {
    object(props! {
        "supplierId" => integer(),
        "officeId" => integer(),
        "supplierNumber" => string(),
        "supplierName" => string(),
        "supplierType" => string(),
        "supplierDescription" => string(),
        "supplierSubdescription" => string(),
        "supplierExtraInfo" => string(),
        "supplierEmail" => string(),
        "supplierPhone" => string(),
        "supplierFax" => string(),
        "supplierWebsite" => string(),
        "supplierRemark" => string(),
        "supplierGuid" => string(),
        "isDeleted" => boolean(),
        "lastModified" => date_time(),
        "isModified" => boolean(),
        "supplierSearchCode" => string(),
        "supplierAssortmentCode" => string(),
        "supplierCountryCode" => string(),
        "supplierCountry" => string(),
        "supplierVatNumber" => string(),
        "supplierBankAccount" => string(),
        "supplierBankName" => string(),
        "supplierBankBic" => string(),
        "supplierBankIban" => string(),
    })
}

fn order_header_props() -> Map<String, Value> {
    props! {
        "customerOrderHeaderId" => integer(),
        "officeId" => integer(),
        "customerOrderNumber" => string(),
        "customerId" => integer(),
        "orderDatetime" => date_time(),
        "orderReference" => string(),
        "preorderEmployeeId" => integer(),
        "employeeId" => integer(),
        "onlineOrderReference" => string(),
        "orderRemark" => string(),
        "orderStatusId" => integer(),
        "orderStatusDescription" => string(),
        "orderStatusColor" => string(),
        "orderStatusIcon" => string(),
        "orderStatusSortOrder" => integer(),
        "orderStatusIsDeleted" => boolean(),
        "lastModified" => date_time(),
        "isModified" => boolean(),
    }
}

/// Schema for the orders stream.
#[must_use]
pub fn orders() -> Value {
    object(order_header_props())
}

fn purchase_order_detail_schema() -> Value {
    object(props! {
        "productPurchaseOrderDetailId" => integer(),
        "productPurchaseOrderId" => integer(),
        "productId" => integer(),
        "supplierProductNumber" => string(),
        "productNumber" => string(),
        "productType" => string(),
        "productDescription" => string(),
        "productSubdescription" => string(),
        "productExtraInfo" => string(),
        "amount" => number(),
        "purchasePriceEx" => number(),
        "minOrderQuantity" => number(),
        "expectedDeliveryWeek" => integer(),
        "expectedDeliveryDate" => date_time(),
        "webserviceStatusEnum" => integer(),
        "orderDetailRemark" => string(),
        "extraPriceInfo" => string(),
        "assortmentCode" => string(),
        "promotionProductId" => integer(),
        "lineId" => string(),
    })
}

fn purchase_order_header_props() -> Map<String, Value> {
    props! {
        "productPurchaseOrderId" => integer(),
        "officeId" => integer(),
        "purchaseOrderNumber" => string(),
        "supplierId" => integer(),
        "orderDatetime" => date_time(),
        "orderReference" => string(),
        "preorderEmployeeId" => integer(),
        "employeeId" => integer(),
        "onlineOrderReference" => string(),
        "orderRemark" => string(),
    }
}

/// Schema for the purchase_orders stream.
#[must_use]
pub fn purchase_orders() -> Value {
    let mut properties = purchase_order_header_props();
    properties.insert(
        "details".to_string(),
        object(props! {
            "items" => array_of(purchase_order_detail_schema()),
        }),
    );
    object(properties)
}

/// Schema for the supplier_products stream, including the flattened
/// purchase-price fields and the synthetic cursor field.
#[must_use]
pub fn supplier_products() -> Value {
    object(props! {
        "productSupplierId" => integer(),
        "productId" => integer(),
        "supplierId" => integer(),
        "supplierProductNumber" => string(),
        "minOrderQuantity" => number(),
        "preferredDefaultSupplier" => boolean(),
        "recommendedSalesPriceInc" => number(),
        "expectedArrivalDatetime" => date_time(),
        "availabilityStatusId" => integer(),
        "supplierStock2" => string(),
        "lastModified" => date_time(),
        "productPurchasePriceId" => integer(),
        "purchasePriceEx" => number(),
        "unix_timestamp" => integer(),
    })
}

/// Schema for the purchase_orders_optiply stream.
#[must_use]
pub fn purchase_orders_optiply() -> Value {
    let mut properties = purchase_order_header_props();
    properties.insert(
        "details".to_string(),
        object(props! {
            "lookups" => array_of(object(props! {
                "fieldName" => string(),
                "lookupValues" => object(props! {
                    "items" => array_of(products()),
                }),
                "lookupType" => string(),
                "pkType" => string(),
            })),
            "items" => array_of(purchase_order_detail_schema()),
        }),
    );
    properties.insert("unix_timestamp".to_string(), integer());
    object(properties)
}

/// Schema for the orders_optiply stream.
#[must_use]
pub fn orders_optiply() -> Value {
    let mut properties = order_header_props();
    properties.insert("unix_timestamp".to_string(), integer());
    object(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_declare_key_fields() {
        assert!(products()["properties"]["productId"].is_object());
        assert!(suppliers()["properties"]["supplierId"].is_object());
        assert!(orders()["properties"]["customerOrderHeaderId"].is_object());
        assert!(purchase_orders()["properties"]["productPurchaseOrderId"].is_object());
        assert!(supplier_products()["properties"]["productSupplierId"].is_object());
    }

    #[test]
    fn test_unix_streams_carry_cursor_field() {
        for schema in [supplier_products(), purchase_orders_optiply(), orders_optiply()] {
            assert_eq!(schema["properties"]["unix_timestamp"], integer());
        }
    }

    #[test]
    fn test_purchase_order_details_nested_shape() {
        let schema = purchase_orders();
        let items = &schema["properties"]["details"]["properties"]["items"];
        assert_eq!(items["type"], serde_json::json!(["array", "null"]));
        assert!(items["items"]["properties"]["purchasePriceEx"].is_object());
    }
}
