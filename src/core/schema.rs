use crate::core::reports::ReportService;
use crate::domain::model::{Conversion, HourlyTraffic, Sales, StoreTraffic, Traffic};
use crate::utils::error::ApiError;
use async_graphql::{Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Schema};

pub type ReportSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// 依商品分攤後的每日人流
    async fn traffics(
        &self,
        ctx: &Context<'_>,
        dates: Vec<Option<String>>,
        store_ids: Vec<Option<i32>>,
        product_ids: Vec<Option<i32>>,
    ) -> async_graphql::Result<Option<Vec<Option<Traffic>>>> {
        let rows = ctx
            .data::<ReportService>()?
            .traffics(&dates, &store_ids, &product_ids)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(rows.into_iter().map(Some).collect()))
    }

    /// 門市層級的每日人流
    async fn store_traffics(
        &self,
        ctx: &Context<'_>,
        dates: Vec<Option<String>>,
        store_ids: Vec<Option<i32>>,
    ) -> async_graphql::Result<Option<Vec<Option<StoreTraffic>>>> {
        let rows = ctx
            .data::<ReportService>()?
            .store_traffics(&dates, &store_ids)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(rows.into_iter().map(Some).collect()))
    }

    async fn hourly_traffics(
        &self,
        ctx: &Context<'_>,
        dates: Vec<Option<String>>,
        store_ids: Vec<Option<i32>>,
        product_ids: Vec<Option<i32>>,
    ) -> async_graphql::Result<Option<Vec<Option<HourlyTraffic>>>> {
        let rows = ctx
            .data::<ReportService>()?
            .hourly_traffics(&dates, &store_ids, &product_ids)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(rows.into_iter().map(Some).collect()))
    }

    async fn sales(
        &self,
        ctx: &Context<'_>,
        dates: Vec<Option<String>>,
        store_ids: Vec<Option<i32>>,
        product_ids: Vec<Option<i32>>,
    ) -> async_graphql::Result<Option<Vec<Option<Sales>>>> {
        let rows = ctx
            .data::<ReportService>()?
            .sales(&dates, &store_ids, &product_ids)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(rows.into_iter().map(Some).collect()))
    }

    /// 人流與交易筆數的轉換率
    async fn conversions(
        &self,
        ctx: &Context<'_>,
        dates: Vec<Option<String>>,
        store_ids: Vec<Option<i32>>,
    ) -> async_graphql::Result<Option<Vec<Option<Conversion>>>> {
        let rows = ctx
            .data::<ReportService>()?
            .conversions(&dates, &store_ids)
            .await
            .map_err(|e| e.extend())?;
        Ok(Some(rows.into_iter().map(Some).collect()))
    }
}

/// 錯誤訊息之外，另外告訴呼叫端錯誤類別與是否值得重試
impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("category", format!("{:?}", self.category()));
            extensions.set("retryable", self.is_retryable());
        })
    }
}

pub fn build_schema(service: ReportService) -> ReportSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(service)
        .finish()
}
